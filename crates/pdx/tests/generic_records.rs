// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Generic records: reading without a domain class, building records at
// runtime, identity equality and dynamic dispatch through the class registry.

#![allow(clippy::float_cmp)]
#![allow(clippy::missing_panics_doc)]

use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use pdx::{
    ClassRegistry, DecodedObject, LocalAuthority, PdxCodec, PdxConfig, PdxError, PdxInstance,
    PdxReader, PdxSerializable, PdxTypeRegistry, PdxValue, PdxWriter, Result,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Order {
    id: i64,
    note: String,
    price: f64,
}

impl PdxSerializable for Order {
    fn class_name(&self) -> &str {
        "shop.Order"
    }

    fn write_fields(&self, w: &mut dyn PdxWriter) -> Result<()> {
        w.write_long("id", self.id)?;
        w.write_string("note", &self.note)?;
        w.write_double("price", self.price)?;
        w.mark_identity_field("id")
    }

    fn read_fields(&mut self, r: &mut dyn PdxReader) -> Result<()> {
        self.id = r.read_long("id")?;
        self.note = r.read_string("note")?;
        self.price = r.read_double("price")?;
        Ok(())
    }
}

fn codec_on(authority: &Arc<LocalAuthority>) -> PdxCodec {
    let authority: Arc<LocalAuthority> = Arc::clone(authority);
    PdxCodec::new(PdxTypeRegistry::new(authority))
}

fn hash_of(instance: &PdxInstance) -> u64 {
    let mut hasher = DefaultHasher::new();
    instance.hash(&mut hasher);
    hasher.finish()
}

fn order_instance(codec: &PdxCodec, id: i64, note: &str) -> PdxInstance {
    let mut factory = codec.instance_factory("shop.Order");
    factory
        .field("id", id)
        .and_then(|f| f.field("note", note))
        .and_then(|f| f.field("price", 2.5f64))
        .and_then(|f| f.mark_identity_field("id"))
        .expect("fields");
    factory.create().expect("create")
}

#[test]
fn factory_record_decodes_as_domain_class_elsewhere() {
    let authority = Arc::new(LocalAuthority::new());
    let builder = codec_on(&authority);
    let consumer = codec_on(&authority);

    let instance = order_instance(&builder, 11, "gift wrap");
    assert_eq!(instance.type_id(), 0);
    let bytes = builder.serialize(&instance).expect("encode");
    assert_ne!(instance.schema().type_id(), 0);

    let order: Order = consumer.deserialize(&bytes).expect("decode");
    assert_eq!(
        order,
        Order {
            id: 11,
            note: "gift wrap".to_owned(),
            price: 2.5,
        }
    );
}

#[test]
fn domain_record_reads_as_instance() {
    let authority = Arc::new(LocalAuthority::new());
    let codec = codec_on(&authority);
    let order = Order {
        id: 3,
        note: "rush".to_owned(),
        price: 9.5,
    };
    let bytes = codec.serialize(&order).expect("encode");

    let instance = codec.read_instance(&bytes).expect("instance");
    assert_eq!(instance.class_name(), "shop.Order");
    assert_eq!(instance.field_names(), vec!["id", "note", "price"]);
    assert!(instance.is_identity_field("id"));
    assert!(!instance.is_identity_field("note"));
    assert_eq!(instance.field("price").expect("price"), Some(PdxValue::Double(9.5)));
    assert_eq!(instance.field("missing").expect("missing"), None);
    assert_eq!(instance.to_string(), "shop.Order[id=3, note=rush, price=9.5]");

    let typed: Order = instance.to_object().expect("to_object");
    assert_eq!(typed, order);

    // an instance re-encodes to the exact bytes it was read from
    assert_eq!(codec.serialize(&instance).expect("re-encode"), bytes);
    assert_eq!(codec.registry().stats().snapshot().instance_creations, 1);
}

#[test]
fn equality_follows_identity_fields() {
    let authority = Arc::new(LocalAuthority::new());
    let codec = codec_on(&authority);

    let a = order_instance(&codec, 1, "first");
    let b = order_instance(&codec, 1, "second");
    let c = order_instance(&codec, 2, "first");
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_ne!(a, c);

    let set: HashSet<PdxInstance> = [a, b, c].into_iter().collect();
    assert_eq!(set.len(), 2);
}

#[test]
fn missing_field_compares_as_default() {
    let authority = Arc::new(LocalAuthority::new());
    let codec = codec_on(&authority);

    let mut short = codec.instance_factory("shop.Tag");
    short.field("label", "blue").expect("label");
    let short = short.create().expect("short");

    let mut zero_weight = codec.instance_factory("shop.Tag");
    zero_weight
        .field("label", "blue")
        .and_then(|f| f.field("weight", 0i32))
        .expect("fields");
    let zero_weight = zero_weight.create().expect("zero");

    let mut heavy = codec.instance_factory("shop.Tag");
    heavy
        .field("label", "blue")
        .and_then(|f| f.field("weight", 5i32))
        .expect("fields");
    let heavy = heavy.create().expect("heavy");

    assert_eq!(short, zero_weight);
    assert_eq!(hash_of(&short), hash_of(&zero_weight));
    assert_ne!(short, heavy);
}

#[test]
fn set_field_updates_the_encoded_record() {
    let authority = Arc::new(LocalAuthority::new());
    let codec = codec_on(&authority);
    let bytes = codec
        .serialize(&Order {
            id: 5,
            note: "old".to_owned(),
            price: 1.0,
        })
        .expect("encode");

    let mut instance = codec.read_instance(&bytes).expect("instance");
    instance.set_field("note", "a much longer note").expect("set");
    assert!(matches!(
        instance.set_field("note", 4i32),
        Err(PdxError::TypeMismatch { .. })
    ));
    assert!(matches!(
        instance.set_field("colour", "red"),
        Err(PdxError::UnknownField { .. })
    ));

    let updated: Order = codec
        .deserialize(&codec.serialize(&instance).expect("encode instance"))
        .expect("decode");
    assert_eq!(updated.id, 5);
    assert_eq!(updated.note, "a much longer note");
    assert_eq!(updated.price, 1.0);
}

#[test]
fn dynamic_decode_uses_registered_classes() {
    let authority = Arc::new(LocalAuthority::new());
    let classes = Arc::new(ClassRegistry::new());
    classes.register::<Order>();
    let codec = codec_on(&authority).with_classes(Arc::clone(&classes));

    let bytes = codec
        .serialize(&Order {
            id: 8,
            note: "dyn".to_owned(),
            price: 0.5,
        })
        .expect("encode");

    match codec.deserialize_dyn(&bytes).expect("decode") {
        DecodedObject::Domain(object) => assert_eq!(object.class_name(), "shop.Order"),
        DecodedObject::Instance(_) => panic!("registered class should decode as domain object"),
    }

    let mut tag = codec.instance_factory("shop.Unregistered");
    tag.field("x", 1i32).expect("x");
    let other = codec.serialize(&tag.create().expect("create")).expect("encode");
    let decoded = codec.deserialize_dyn(&other).expect("decode");
    assert_eq!(decoded.class_name(), "shop.Unregistered");
    assert!(decoded.into_instance().is_some());

    codec
        .registry()
        .set_config(PdxConfig::default().with_read_serialized(true));
    let decoded = codec.deserialize_dyn(&bytes).expect("decode");
    let instance = decoded.into_instance().expect("generic record");
    assert_eq!(instance.field("id").expect("id"), Some(PdxValue::Long(8)));
}

#[test]
fn instances_cannot_be_decode_targets() {
    let authority = Arc::new(LocalAuthority::new());
    let codec = codec_on(&authority);
    let bytes = codec.serialize(&Order::default()).expect("encode");
    let mut instance = codec.read_instance(&bytes).expect("instance");
    assert!(matches!(
        codec.deserialize_into(&bytes, &mut instance),
        Err(PdxError::Unsupported(_))
    ));
}
