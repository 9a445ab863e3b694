use dynamap::{
    prelude::*,
    schema::{SecondaryIndex, derive_schema},
    tags::MetadataError,
};
use std::collections::BTreeSet;

#[derive(Clone, Debug, Default, PartialEq, Fields)]
struct Contact {
    #[dynamap(attr = "email", index = "by_email,partition,,,keys_only")]
    email: String,

    #[dynamap(attr = "phone,omitempty")]
    phone: Option<String>,
}

#[derive(Debug, Default, Record)]
struct Customer {
    #[dynamap(base)]
    base: BaseFields,

    #[dynamap(attr = "tenant", key = "partition", index = "by_tier,include")]
    tenant: String,

    #[dynamap(attr = "name", key = "sort")]
    name: String,

    #[dynamap(attr = "tier", index = "by_tier,partition,2,1")]
    tier: u8,

    #[dynamap(attr = "labels")]
    labels: BTreeSet<String>,

    #[dynamap(attr = "joined,unixtime")]
    joined: Timestamp,

    contact: Contact,

    #[dynamap(attr = "notes", wire = "L")]
    notes: Vec<String>,

    #[dynamap(attr = "_")]
    cache: String,
}

fn schema() -> Schema {
    derive_schema::<Customer>(&Config::strict()).expect("customer schema is valid")
}

#[test]
fn table_key_is_tenant_then_name() {
    let schema = schema();

    assert_eq!(schema.partition_key(), Some("tenant"));
    assert_eq!(schema.sort_key(), Some("name"));
    assert_eq!(schema.key_schema[0].role.key_type(), "HASH");
    assert_eq!(schema.key_schema[1].role.key_type(), "RANGE");
}

#[test]
fn every_serialized_field_is_defined() {
    let schema = schema();
    let defined: Vec<_> = schema
        .attribute_definitions
        .iter()
        .map(|a| (a.name.as_str(), a.wire_type.code()))
        .collect();

    assert_eq!(
        defined,
        [
            ("c_at", "S"),
            ("deleted", "BOOL"),
            ("email", "S"),
            ("id", "S"),
            ("joined", "N"),
            ("labels", "SS"),
            ("name", "S"),
            ("notes", "L"),
            ("phone", "S"),
            ("tenant", "S"),
            ("tier", "N"),
            ("u_at", "S"),
        ]
    );
    assert!(schema.attribute("contact").is_none());
    assert!(schema.attribute("cache").is_none());
}

#[test]
fn nested_index_membership_is_collected() {
    let schema = schema();
    let by_email: &SecondaryIndex = schema.index("by_email").expect("by_email exists");

    assert_eq!(by_email.partition_key(), Some("email"));
    assert_eq!(by_email.projection, ProjectionMode::KeysOnly);
}

#[test]
fn include_member_becomes_non_key_attribute() {
    let schema = schema();
    let by_tier = schema.index("by_tier").expect("by_tier exists");

    assert_eq!(by_tier.key_schema.len(), 1);
    assert_eq!(by_tier.partition_key(), Some("tier"));
    assert_eq!(by_tier.sort_key(), None);
    assert_eq!(by_tier.projection, ProjectionMode::Include);
    assert_eq!(by_tier.non_key_attributes, ["tenant"]);
    assert_eq!(
        by_tier.throughput.map(|t| (t.read, t.write)),
        Some((2, 1))
    );
}

#[test]
fn create_definitions_are_key_attributes() {
    let names: Vec<_> = schema()
        .key_attribute_definitions()
        .into_iter()
        .map(|a| a.name)
        .collect();

    assert_eq!(names, ["email", "name", "tenant", "tier"]);
}

///
/// Malformed metadata
///

#[derive(Debug, Default, Record)]
struct Sloppy {
    #[dynamap(base)]
    base: BaseFields,

    #[dynamap(attr = "score,sorted", wire = "number", key = "primary")]
    score: i32,

    #[dynamap(attr = "rank", index = "by_rank,partition,x,y,z")]
    rank: i32,
}

#[test]
fn lenient_mode_degrades_malformed_metadata() {
    let schema = derive_schema::<Sloppy>(&Config::default()).expect("lenient never fails");

    assert_eq!(schema.attribute("score").map(|a| a.wire_type), Some(WireType::Number));
    assert_eq!(schema.partition_key(), Some("id"));
    assert!(schema.index("by_rank").is_some());
}

#[test]
fn strict_mode_reports_the_first_problem() {
    let err = derive_schema::<Sloppy>(&Config::strict()).unwrap_err();

    assert!(matches!(err, MetadataError::UnknownOption { field: "score", .. }), "{err}");
}

#[test]
fn config_file_selects_strict_mode() {
    let config = Config::from_toml_str("metadata = \"strict\"").expect("valid config");

    assert!(derive_schema::<Sloppy>(&config).is_err());
    assert!(derive_schema::<Customer>(&config).is_ok());
}

#[test]
fn derivation_is_thread_safe() {
    let expected = schema();
    let workers: Vec<_> = (0..4).map(|_| std::thread::spawn(schema)).collect();

    for worker in workers {
        assert_eq!(worker.join().expect("worker finished"), expected);
    }
}
