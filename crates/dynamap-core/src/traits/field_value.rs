use crate::{
    model::FieldKind,
    types::{Blob, Timestamp},
    value::{Value, ValueError},
};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    hash::{BuildHasher, Hash},
};

///
/// FieldValue
///
/// Conversion between a field's Rust type and the runtime `Value`.
/// `from_value` is the type check performed by `set`: it accepts any value
/// that converts losslessly and rejects the rest.
///

pub trait FieldValue: Sized {
    const KIND: FieldKind;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> Result<Self, ValueError>;
}

///
/// Integers
///

macro_rules! impl_signed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                const KIND: FieldKind = FieldKind::Int;

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Int(v) => {
                            Self::try_from(v).map_err(|_| ValueError::out_of_range(v, stringify!($ty)))
                        }
                        Value::Uint(v) => {
                            Self::try_from(v).map_err(|_| ValueError::out_of_range(v, stringify!($ty)))
                        }
                        other => Err(ValueError::type_mismatch(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

macro_rules! impl_unsigned {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FieldValue for $ty {
                const KIND: FieldKind = FieldKind::Int;

                fn to_value(&self) -> Value {
                    Value::Uint(u64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Uint(v) => {
                            Self::try_from(v).map_err(|_| ValueError::out_of_range(v, stringify!($ty)))
                        }
                        Value::Int(v) => {
                            Self::try_from(v).map_err(|_| ValueError::out_of_range(v, stringify!($ty)))
                        }
                        other => Err(ValueError::type_mismatch(stringify!($ty), &other)),
                    }
                }
            }
        )*
    };
}

impl_signed!(i8, i16, i32, i64);
impl_unsigned!(u8, u16, u32, u64);

///
/// Floats
///

impl FieldValue for f64 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Float(v) => Ok(v),
            // exact up to 2^53
            Value::Int(v) if v.unsigned_abs() <= 1 << 53 => Ok(v as Self),
            Value::Uint(v) if v <= 1 << 53 => Ok(v as Self),
            Value::Int(v) => Err(ValueError::out_of_range(v, "f64")),
            Value::Uint(v) => Err(ValueError::out_of_range(v, "f64")),
            other => Err(ValueError::type_mismatch("f64", &other)),
        }
    }
}

impl FieldValue for f32 {
    const KIND: FieldKind = FieldKind::Float;

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Result<Self, ValueError> {
        let wide = f64::from_value(value)?;
        let narrow = wide as Self;

        if f64::from(narrow) == wide || wide.is_nan() {
            Ok(narrow)
        } else {
            Err(ValueError::out_of_range(wide, "f32"))
        }
    }
}

///
/// Scalars
///

impl FieldValue for bool {
    const KIND: FieldKind = FieldKind::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(ValueError::type_mismatch("bool", &other)),
        }
    }
}

impl FieldValue for String {
    const KIND: FieldKind = FieldKind::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(ValueError::type_mismatch("text", &other)),
        }
    }
}

impl FieldValue for Timestamp {
    const KIND: FieldKind = FieldKind::Timestamp;

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Timestamp(v) => Ok(v),
            Value::Text(s) => Self::parse_rfc3339(&s),
            other => Err(ValueError::type_mismatch("timestamp", &other)),
        }
    }
}

impl FieldValue for Blob {
    const KIND: FieldKind = FieldKind::Blob;

    fn to_value(&self) -> Value {
        Value::Blob(self.to_vec())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Blob(v) => Ok(Self::new(v)),
            other => Err(ValueError::type_mismatch("blob", &other)),
        }
    }
}

///
/// Wrappers
///

impl<T: FieldValue> FieldValue for Option<T> {
    const KIND: FieldKind = T::KIND;

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, FieldValue::to_value)
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FieldValue> FieldValue for Box<T> {
    const KIND: FieldKind = T::KIND;

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        T::from_value(value).map(Self::new)
    }
}

///
/// Collections
///

fn collect_items<T: FieldValue, C: FromIterator<T>>(
    items: Vec<Value>,
) -> Result<C, ValueError> {
    items.into_iter().map(T::from_value).collect()
}

impl<T: FieldValue> FieldValue for Vec<T> {
    const KIND: FieldKind = FieldKind::List;

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::List(items) | Value::Set(items) => collect_items(items),
            other => Err(ValueError::type_mismatch("list", &other)),
        }
    }
}

impl<T: FieldValue + Ord> FieldValue for BTreeSet<T> {
    const KIND: FieldKind = FieldKind::set_of(T::KIND);

    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Set(items) | Value::List(items) => collect_items(items),
            other => Err(ValueError::type_mismatch("set", &other)),
        }
    }
}

impl<T, S> FieldValue for HashSet<T, S>
where
    T: FieldValue + Eq + Hash,
    S: BuildHasher + Default,
{
    const KIND: FieldKind = FieldKind::set_of(T::KIND);

    fn to_value(&self) -> Value {
        Value::Set(self.iter().map(FieldValue::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Set(items) | Value::List(items) => collect_items(items),
            other => Err(ValueError::type_mismatch("set", &other)),
        }
    }
}

fn collect_entries<V: FieldValue, C: FromIterator<(String, V)>>(
    entries: BTreeMap<String, Value>,
) -> Result<C, ValueError> {
    entries
        .into_iter()
        .map(|(k, v)| V::from_value(v).map(|v| (k, v)))
        .collect()
}

impl<V: FieldValue> FieldValue for BTreeMap<String, V> {
    const KIND: FieldKind = FieldKind::Map;

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(entries) => collect_entries(entries),
            other => Err(ValueError::type_mismatch("map", &other)),
        }
    }
}

impl<V, S> FieldValue for HashMap<String, V, S>
where
    V: FieldValue,
    S: BuildHasher + Default,
{
    const KIND: FieldKind = FieldKind::Map;

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Map(entries) => collect_entries(entries),
            other => Err(ValueError::type_mismatch("map", &other)),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_widen_and_check_range() {
        assert_eq!(i64::from_value(Value::Uint(7)), Ok(7));
        assert_eq!(u8::from_value(Value::Int(255)), Ok(255));

        assert!(matches!(
            u8::from_value(Value::Int(-1)),
            Err(ValueError::OutOfRange { target: "u8", .. })
        ));
        assert!(matches!(
            i32::from_value(Value::Text("1".into())),
            Err(ValueError::TypeMismatch { expected: "i32", found: "text" })
        ));
    }

    #[test]
    fn floats_accept_exact_integers() {
        assert_eq!(f64::from_value(Value::Int(3)), Ok(3.0));
        assert_eq!(f32::from_value(Value::Float(0.5)), Ok(0.5));
        assert!(f32::from_value(Value::Float(0.1)).is_err());
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(Option::<String>::from_value(Value::Null), Ok(None));
        assert_eq!(Some(3_u32).to_value(), Value::Uint(3));
        assert_eq!(Option::<u32>::None.to_value(), Value::Null);
    }

    #[test]
    fn set_kinds_follow_element() {
        assert!(matches!(
            <BTreeSet<String> as FieldValue>::KIND,
            FieldKind::Set(crate::model::SetKind::Text)
        ));
        assert!(matches!(
            <HashSet<u16> as FieldValue>::KIND,
            FieldKind::Set(crate::model::SetKind::Number)
        ));
        assert!(matches!(
            <BTreeSet<bool> as FieldValue>::KIND,
            FieldKind::Set(crate::model::SetKind::Other)
        ));
    }

    #[test]
    fn timestamp_accepts_text() {
        let ts = Timestamp::from_value(Value::Text("2024-01-02T03:04:05Z".into())).unwrap();

        assert_eq!(ts.to_rfc3339(), "2024-01-02T03:04:05Z");
    }

    #[test]
    fn map_rejects_bad_entry() {
        let mut entries = BTreeMap::new();
        entries.insert("a".to_string(), Value::Int(1));
        entries.insert("b".to_string(), Value::Bool(true));

        assert!(BTreeMap::<String, i64>::from_value(Value::Map(entries)).is_err());
    }
}
