// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)]
#![allow(clippy::cast_possible_truncation)]

//! Codec throughput benchmarks
//!
//! Measures:
//! - Encoding a known class at several payload sizes
//! - Decoding as the same version and as an older version
//! - Single-field access on a generic record

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use pdx::{
    LocalAuthority, PdxCodec, PdxConfig, PdxReader, PdxSerializable, PdxTypeRegistry, PdxWriter,
    Result,
};

#[derive(Debug, Default, Clone)]
struct Quote {
    symbol: String,
    bid: f64,
    ask: f64,
    volume: i64,
    venues: Vec<String>,
    history: Vec<f64>,
}

impl PdxSerializable for Quote {
    fn class_name(&self) -> &str {
        "bench.Quote"
    }

    fn write_fields(&self, w: &mut dyn PdxWriter) -> Result<()> {
        w.write_string("symbol", &self.symbol)?;
        w.write_double("bid", self.bid)?;
        w.write_double("ask", self.ask)?;
        w.write_long("volume", self.volume)?;
        w.write_string_array("venues", &self.venues)?;
        w.write_double_array("history", &self.history)
    }

    fn read_fields(&mut self, r: &mut dyn PdxReader) -> Result<()> {
        self.symbol = r.read_string("symbol")?;
        self.bid = r.read_double("bid")?;
        self.ask = r.read_double("ask")?;
        self.volume = r.read_long("volume")?;
        self.venues = r.read_string_array("venues")?;
        self.history = r.read_double_array("history")?;
        Ok(())
    }
}

/// Older version of [`Quote`] without the trailing arrays.
#[derive(Debug, Default)]
struct QuoteV1 {
    symbol: String,
    bid: f64,
    ask: f64,
}

impl PdxSerializable for QuoteV1 {
    fn class_name(&self) -> &str {
        "bench.Quote"
    }

    fn write_fields(&self, w: &mut dyn PdxWriter) -> Result<()> {
        w.write_string("symbol", &self.symbol)?;
        w.write_double("bid", self.bid)?;
        w.write_double("ask", self.ask)
    }

    fn read_fields(&mut self, r: &mut dyn PdxReader) -> Result<()> {
        self.symbol = r.read_string("symbol")?;
        self.bid = r.read_double("bid")?;
        self.ask = r.read_double("ask")?;
        Ok(())
    }
}

fn quote(history: usize) -> Quote {
    Quote {
        symbol: "ACME".to_owned(),
        bid: 101.25,
        ask: 101.5,
        volume: 1_000_000,
        venues: vec!["XNAS".to_owned(), "XNYS".to_owned()],
        history: (0..history).map(|i| i as f64 * 0.5).collect(),
    }
}

fn codec_on(authority: &Arc<LocalAuthority>) -> PdxCodec {
    let authority: Arc<LocalAuthority> = Arc::clone(authority);
    PdxCodec::new(PdxTypeRegistry::new(authority))
}

const SIZES: [usize; 3] = [4, 256, 8192];

fn bench_encode(c: &mut Criterion) {
    let codec = codec_on(&Arc::new(LocalAuthority::new()));
    let mut group = c.benchmark_group("encode");

    for history in SIZES {
        let value = quote(history);
        let len = codec.serialize(&value).expect("warm up").len();
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(history), &value, |b, value| {
            let mut out = Vec::with_capacity(len);
            b.iter(|| {
                out.clear();
                codec
                    .serialize_into(black_box(value), &mut out)
                    .expect("encode");
                black_box(out.len())
            });
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let authority = Arc::new(LocalAuthority::new());
    let codec = codec_on(&authority);
    // the target keeps no retention handle
    let older = PdxCodec::new(PdxTypeRegistry::with_config(
        authority.clone(),
        PdxConfig::default().with_ignore_unread_fields(true),
    ));
    older
        .serialize(&QuoteV1::default())
        .expect("register older version");

    let mut group = c.benchmark_group("decode");
    for history in SIZES {
        let bytes = codec.serialize(&quote(history)).expect("encode");
        group.throughput(Throughput::Bytes(bytes.len() as u64));

        group.bench_with_input(BenchmarkId::new("same_version", history), &bytes, |b, bytes| {
            b.iter(|| {
                let q: Quote = codec.deserialize(black_box(bytes)).expect("decode");
                black_box(q.volume)
            });
        });

        group.bench_with_input(BenchmarkId::new("older_version", history), &bytes, |b, bytes| {
            let mut target = QuoteV1::default();
            b.iter(|| {
                older
                    .deserialize_into(black_box(bytes), &mut target)
                    .expect("decode");
                black_box(target.ask)
            });
        });
    }
    group.finish();
}

fn bench_instance_field(c: &mut Criterion) {
    let codec = codec_on(&Arc::new(LocalAuthority::new()));
    let bytes = codec.serialize(&quote(256)).expect("encode");
    let instance = codec.read_instance(&bytes).expect("instance");

    c.bench_function("instance_field_volume", |b| {
        b.iter(|| black_box(instance.field(black_box("volume")).expect("field")));
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_instance_field);
criterion_main!(benches);
