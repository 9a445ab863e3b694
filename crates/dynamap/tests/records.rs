use dynamap::{
    Error,
    access::{self, AccessError},
    prelude::*,
    session::MemorySession,
    value::ValueError,
    wire::Encoder,
};
use std::{collections::BTreeMap, sync::Arc};

#[derive(Clone, Debug, Default, PartialEq, Fields)]
struct Address {
    #[dynamap(attr = "street")]
    street: String,

    #[dynamap(attr = "city")]
    city: String,
}

#[derive(Clone, Debug, Default, Record)]
struct Member {
    #[dynamap(base)]
    base: BaseFields,

    #[dynamap(attr = "handle", key = "partition")]
    handle: String,

    #[dynamap(attr = "karma")]
    karma: i64,

    #[dynamap(attr = "prefs")]
    prefs: BTreeMap<String, bool>,

    #[dynamap(attr = "avatar,omitempty")]
    avatar: Option<Blob>,

    address: Address,
}

fn registry() -> (Registry, Arc<MemorySession>) {
    let session = Arc::new(MemorySession::new());
    let mut registry = Registry::new(Config::default());
    registry
        .attach_session(session.clone())
        .expect("first attach succeeds");
    registry
        .register("Members", Member::default)
        .expect("member schema is valid");

    (registry, session)
}

#[test]
fn handle_get_and_set_by_identifier() {
    let (registry, _) = registry();
    let table = registry.table::<Member>("members").unwrap();
    let mut member = table.new_record();

    assert!(member.set("handle", "ferris"));
    assert!(member.set("karma", 12_i64));
    assert!(member.set("deleted", true));
    assert!(!member.set("nickname", "crab"));

    assert_eq!(member.get("handle"), Ok(Value::Text("ferris".into())));
    assert_eq!(member.get("karma"), Ok(Value::Int(12)));
    assert_eq!(member.get("deleted"), Ok(Value::Bool(true)));
    assert!(matches!(
        member.get("nickname"),
        Err(AccessError::FieldNotFound(name)) if name == "nickname"
    ));
}

#[test]
fn set_rejects_values_that_do_not_fit() {
    let (registry, _) = registry();
    let mut member = registry.table::<Member>("members").unwrap().new_record();
    member.karma = 3;

    let err = member.try_set("karma", "lots").unwrap_err();

    assert!(matches!(
        err,
        AccessError::Value {
            source: ValueError::TypeMismatch { expected: "i64", .. },
            ..
        }
    ));
    assert_eq!(member.karma, 3);
}

#[test]
fn nested_record_set_as_a_whole() {
    let (registry, _) = registry();
    let mut member = registry.table::<Member>("members").unwrap().new_record();
    let address = Address {
        street: "1 Main".into(),
        city: "Springfield".into(),
    };

    assert!(member.set("address", address.to_value()));
    assert_eq!(member.address, address);
}

#[test]
fn marshal_flattens_and_merges() {
    let mut member = Member {
        handle: "ferris".into(),
        karma: -2,
        address: Address {
            street: "1 Main".into(),
            city: "Springfield".into(),
        },
        ..Member::default()
    };
    member.prefs.insert("dark".into(), true);
    member.base.id = "m-1".into();

    let item = access::marshal(&member, &Encoder::default()).unwrap();

    assert_eq!(item["id"], AttributeValue::S("m-1".into()));
    assert_eq!(item["handle"], AttributeValue::S("ferris".into()));
    assert_eq!(item["karma"], AttributeValue::N("-2".into()));
    assert_eq!(item["city"], AttributeValue::S("Springfield".into()));
    assert_eq!(item["prefs"].as_m().unwrap()["dark"], AttributeValue::Bool(true));
    assert!(!item.contains_key("avatar"));
    assert!(!item.contains_key("address"));
    assert_eq!(item["c_at"], AttributeValue::S("0001-01-01T00:00:00Z".into()));
}

#[test]
fn save_writes_through_the_registry_session() {
    let (registry, session) = registry();
    registry.create_all().unwrap();

    let table = registry.table::<Member>("MEMBERS").unwrap();
    let mut member = table.new_record();
    member.handle = "ferris".into();
    member.avatar = Some(Blob::from(&[1_u8, 2][..]));
    member.save().unwrap();

    let stored = session.items("members").unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0]["avatar"], AttributeValue::B(vec![1, 2]));
    assert_eq!(stored[0]["id"].as_s(), Some(member.base.id.as_str()));
    assert_eq!(
        stored[0]["u_at"].as_s().map(str::to_string),
        Some(member.base.updated_at.to_rfc3339())
    );
}

#[test]
fn save_without_session_fails() {
    let mut registry = Registry::default();
    let table = registry.register("members", Member::default).unwrap();
    let mut member = table.new_record();
    member.handle = "x".into();

    let err = member.save().unwrap_err();

    assert!(matches!(err, Error::NoSession(ref name) if name == "members"));
    assert!(!err.is_field_not_found());
}

#[test]
fn save_reports_missing_table() {
    let (registry, _) = registry();
    let mut member = registry.table::<Member>("members").unwrap().new_record();
    member.handle = "x".into();

    assert!(matches!(member.save(), Err(Error::Session(_))));
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn integers_survive_set_get_and_marshal(karma in any::<i64>(), handle in "[a-z]{1,12}") {
            let mut member = Member::default();

            prop_assert!(access::set(&mut member, "karma", Value::Int(karma)));
            prop_assert!(access::set(&mut member, "handle", Value::Text(handle.clone())));
            prop_assert_eq!(access::get(&member, "karma"), Ok(Value::Int(karma)));

            let item = access::marshal(&member, &Encoder::default()).unwrap();
            let karma_str = karma.to_string();
            prop_assert_eq!(item["karma"].as_n(), Some(karma_str.as_str()));
            prop_assert_eq!(item["handle"].as_s(), Some(handle.as_str()));
        }
    }
}
