use super::*;
use crate::traits::{FieldValue, Fields};
use dynamap_derive::Fields;

#[derive(Clone, Debug, Default, Fields, PartialEq)]
struct Point {
    #[dynamap(attr = "x")]
    x: i32,

    #[dynamap(attr = "y")]
    y: i32,

    label: Option<String>,
}

#[derive(Clone, Debug, Default, Fields, PartialEq)]
struct Other {
    #[dynamap(attr = "x")]
    x: i32,
}

#[test]
fn empty_like_values() {
    for value in [
        Value::Null,
        Value::Bool(false),
        Value::Int(0),
        Value::Uint(0),
        Value::Float(0.0),
        Value::Text(String::new()),
        Value::List(vec![]),
        Value::Map(BTreeMap::new()),
        Value::Timestamp(Timestamp::zero()),
    ] {
        assert!(value.is_empty_like(), "{value:?}");
    }

    for value in [Value::Bool(true), Value::Int(-1), Value::Text("a".into())] {
        assert!(!value.is_empty_like(), "{value:?}");
    }
}

#[test]
fn record_capture_and_restore() {
    let point = Point {
        x: 3,
        y: -4,
        label: Some("p".into()),
    };

    let value = point.to_value();
    let record = value.as_record().unwrap();
    assert_eq!(record.path(), Point::PATH);
    assert_eq!(record.get("y"), Some(&Value::Int(-4)));
    assert_eq!(record.get("label"), Some(&Value::Text("p".into())));
    assert_eq!(record.get("z"), None);

    assert_eq!(Point::from_value(value), Ok(point));
}

#[test]
fn restore_rejects_other_records() {
    let value = Other { x: 1 }.to_value();

    assert!(matches!(
        Point::from_value(value),
        Err(ValueError::RecordMismatch { .. })
    ));
    assert!(matches!(
        Point::from_value(Value::Int(1)),
        Err(ValueError::TypeMismatch { found: "int", .. })
    ));
}

#[test]
fn restore_reports_failing_field() {
    let mut record = RecordValue::capture(&Point::default());
    record.entries[0].1 = Value::Text("nope".into());

    let err = record.restore::<Point>().unwrap_err();

    assert!(matches!(err, ValueError::Field { field: "x", .. }));
    assert!(err.to_string().starts_with("field 'x'"));
}

#[test]
fn equivalence_ignores_set_order_only() {
    let ab = Value::Set(vec![Value::Text("a".into()), Value::Text("b".into())]);
    let ba = Value::Set(vec![Value::Text("b".into()), Value::Text("a".into())]);
    assert!(ab.is_equivalent(&ba));
    assert!(!ab.is_equivalent(&Value::Set(vec![Value::Text("a".into())])));

    let list_ab = Value::List(vec![Value::Int(1), Value::Int(2)]);
    let list_ba = Value::List(vec![Value::Int(2), Value::Int(1)]);
    assert!(!list_ab.is_equivalent(&list_ba));

    assert!(!Value::Int(5).is_equivalent(&Value::Uint(5)));
}
