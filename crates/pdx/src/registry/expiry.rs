// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Deadline-ordered task runner on a dedicated thread.
//!
//! Tasks are scheduled, pushed back or cancelled through a channel. The
//! thread sleeps until the earliest deadline or the next command and runs
//! due tasks itself, so tasks must be short.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};

/// Identifier of one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

type Task = Box<dyn FnOnce(TaskId) + Send + 'static>;

enum Command {
    Schedule { id: TaskId, deadline: Instant, task: Task },
    Reschedule { id: TaskId, deadline: Instant },
    Cancel { id: TaskId },
    CancelAll,
}

/// Timer thread handle. Dropping it stops and joins the thread; pending
/// tasks are discarded.
pub struct ExpiryScheduler {
    commands: Option<Sender<Command>>,
    thread: Option<JoinHandle<()>>,
    next_id: AtomicU64,
}

impl ExpiryScheduler {
    pub fn spawn(name: &str) -> Self {
        let (tx, rx) = channel::unbounded();
        let thread = std::thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || run(rx))
            .map_err(|e| log::warn!("[pdx::expiry] failed to spawn timer thread: {}", e))
            .ok();
        Self {
            commands: Some(tx),
            thread,
            next_id: AtomicU64::new(1),
        }
    }

    /// Run `task` once `delay` has elapsed unless cancelled first.
    pub fn schedule<F>(&self, delay: Duration, task: F) -> TaskId
    where
        F: FnOnce(TaskId) + Send + 'static,
    {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.send(Command::Schedule {
            id,
            deadline: Instant::now() + delay,
            task: Box::new(task),
        });
        id
    }

    /// Move an existing task's deadline to `delay` from now.
    pub fn reschedule(&self, id: TaskId, delay: Duration) {
        self.send(Command::Reschedule {
            id,
            deadline: Instant::now() + delay,
        });
    }

    pub fn cancel(&self, id: TaskId) {
        self.send(Command::Cancel { id });
    }

    pub fn cancel_all(&self) {
        self.send(Command::CancelAll);
    }

    fn send(&self, command: Command) {
        if let Some(tx) = &self.commands {
            if tx.send(command).is_err() {
                log::debug!("[pdx::expiry] timer thread gone, command dropped");
            }
        }
    }
}

impl Drop for ExpiryScheduler {
    fn drop(&mut self) {
        // Disconnect first so the thread's receive returns.
        drop(self.commands.take());
        if let Some(handle) = self.thread.take() {
            // A task may hold the last owner of the scheduler.
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

fn run(rx: Receiver<Command>) {
    let mut by_deadline: BTreeMap<(Instant, TaskId), Task> = BTreeMap::new();
    let mut deadlines: HashMap<TaskId, Instant> = HashMap::new();

    loop {
        let received = match by_deadline.keys().next() {
            Some(&(deadline, _)) => rx.recv_deadline(deadline),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Command::Schedule { id, deadline, task }) => {
                deadlines.insert(id, deadline);
                by_deadline.insert((deadline, id), task);
            }
            Ok(Command::Reschedule { id, deadline }) => {
                if let Some(old) = deadlines.get_mut(&id) {
                    if let Some(task) = by_deadline.remove(&(*old, id)) {
                        *old = deadline;
                        by_deadline.insert((deadline, id), task);
                    }
                }
            }
            Ok(Command::Cancel { id }) => {
                if let Some(old) = deadlines.remove(&id) {
                    by_deadline.remove(&(old, id));
                }
            }
            Ok(Command::CancelAll) => {
                by_deadline.clear();
                deadlines.clear();
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let now = Instant::now();
        while let Some(entry) = by_deadline.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((_, id), task) = entry.remove_entry();
            deadlines.remove(&id);
            task(id);
        }
    }
}
