//! Record accessor: generic get/set/marshal over descriptor tables, and the
//! table-bound `RecordHandle`.

use crate::{
    Error,
    model::{BaseFields, FieldAccessor},
    schema::Schema,
    session::SessionSlot,
    tags,
    traits::{Fields, Record},
    types::Timestamp,
    value::{RecordValue, Value, ValueError},
    wire::{Encoder, EncodingError, Item},
};
use std::{
    ops::{Deref, DerefMut},
    sync::Arc,
};
use thiserror::Error as ThisError;
use ulid::Ulid;

///
/// AccessError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum AccessError {
    #[error("field '{field}' read back {stored} after {written} was written")]
    Altered {
        field: String,
        written: &'static str,
        stored: &'static str,
    },

    #[error("field with name '{0}' not found")]
    FieldNotFound(String),

    #[error("cannot set field '{field}': {source}")]
    Value {
        field: String,
        #[source]
        source: ValueError,
    },
}

/// Read a field by declared identifier. Declared fields shadow base fields.
pub fn get<R: Record>(record: &R, field: &str) -> Result<Value, AccessError> {
    if let Some(accessor) = R::accessor(field) {
        return Ok((accessor.get)(record));
    }
    if let Some(accessor) = BaseFields::accessor(field) {
        return Ok((accessor.get)(record.base()));
    }

    Err(AccessError::FieldNotFound(field.to_string()))
}

/// Write a field by declared identifier. The write only counts if the field
/// reads back an equivalent value; otherwise the previous value is restored.
pub fn try_set<R: Record>(record: &mut R, field: &str, value: Value) -> Result<(), AccessError> {
    if let Some(accessor) = R::accessor(field) {
        write(record, accessor, value)
    } else if let Some(accessor) = BaseFields::accessor(field) {
        write(record.base_mut(), accessor, value)
    } else {
        Err(AccessError::FieldNotFound(field.to_string()))
    }
}

fn write<F>(target: &mut F, accessor: &FieldAccessor<F>, value: Value) -> Result<(), AccessError> {
    let rejected = |source| AccessError::Value {
        field: accessor.ident.to_string(),
        source,
    };

    let previous = (accessor.get)(target);
    (accessor.set)(target, value.clone()).map_err(rejected)?;

    let stored = (accessor.get)(target);
    if stored.is_equivalent(&value) {
        return Ok(());
    }

    (accessor.set)(target, previous).map_err(rejected)?;

    Err(AccessError::Altered {
        field: accessor.ident.to_string(),
        written: value.kind_name(),
        stored: stored.kind_name(),
    })
}

/// `try_set` reduced to whether the write happened.
pub fn set<R: Record>(record: &mut R, field: &str, value: Value) -> bool {
    try_set(record, field, value).is_ok()
}

/// Encode base and declared fields into one item. Base fields redeclared by
/// a serialized field of `R` are left out; on a storage-name clash the
/// declared attribute wins.
pub fn marshal<R: Record>(record: &R, encoder: &Encoder) -> Result<Item, EncodingError> {
    let mut shadowed = Vec::new();
    for field in R::SCHEMA {
        if BaseFields::accessor(field.ident).is_some()
            && !tags::parse(field, encoder.mode())?.is_skipped(field)
        {
            shadowed.push(field.ident);
        }
    }

    let mut base = RecordValue::capture(record.base());
    base.retain(|ident| !shadowed.iter().any(|name| *name == ident));

    let mut item = encoder.encode_record(&base)?;
    item.extend(encoder.encode_record(&RecordValue::capture(record))?);

    Ok(item)
}

///
/// Binding
///
/// What a record needs to persist itself: the owning table's name and
/// schema, its encoder, and the shared session slot.
///

#[derive(Clone, Debug)]
pub struct Binding {
    pub(crate) table_name: Arc<str>,
    pub(crate) schema: Arc<Schema>,
    pub(crate) encoder: Encoder,
    pub(crate) session: SessionSlot,
}

///
/// RecordHandle
///
/// A record produced by a table, bound to it by construction.
///

#[derive(Clone, Debug)]
pub struct RecordHandle<R> {
    record: R,
    binding: Binding,
}

impl<R: Record> RecordHandle<R> {
    pub(crate) const fn new(record: R, binding: Binding) -> Self {
        Self { record, binding }
    }

    #[must_use]
    pub const fn record(&self) -> &R {
        &self.record
    }

    pub const fn record_mut(&mut self) -> &mut R {
        &mut self.record
    }

    #[must_use]
    pub fn into_inner(self) -> R {
        self.record
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.binding.table_name
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.binding.schema
    }

    pub fn get(&self, field: &str) -> Result<Value, AccessError> {
        get(&self.record, field)
    }

    pub fn try_set(&mut self, field: &str, value: impl Into<Value>) -> Result<(), AccessError> {
        try_set(&mut self.record, field, value.into())
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> bool {
        set(&mut self.record, field, value.into())
    }

    pub fn marshal(&self) -> Result<Item, EncodingError> {
        marshal(&self.record, &self.binding.encoder)
    }

    /// Stamp audit fields, assign an identity if there is none, and write the
    /// record through the table's session.
    pub fn save(&mut self) -> Result<(), Error> {
        let session = self
            .binding
            .session
            .get()
            .cloned()
            .ok_or_else(|| Error::NoSession(self.binding.table_name.to_string()))?;

        let base = self.record.base_mut();
        if base.id.is_empty() {
            base.id = Ulid::new().to_string();
        }
        base.touch(Timestamp::now());

        let item = self.marshal()?;
        session.put_item(&self.binding.table_name, item)?;

        tracing::debug!(
            table = %self.binding.table_name,
            id = %self.record.base().id,
            "saved record"
        );

        Ok(())
    }
}

impl<R> Deref for RecordHandle<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.record
    }
}

impl<R> DerefMut for RecordHandle<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.record
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::AttributeValue;
    use dynamap_derive::Record;

    #[derive(Clone, Debug, Default, Record)]
    struct Note {
        #[dynamap(base)]
        base: BaseFields,

        #[dynamap(attr = "title")]
        title: String,

        #[dynamap(attr = "words")]
        words: u32,
    }

    #[derive(Clone, Debug, Default, Record)]
    struct Counter {
        #[dynamap(base)]
        base: BaseFields,

        #[dynamap(attr = "id")]
        id: u64,
    }

    #[derive(Clone, Debug, Default, Record)]
    struct Renamed {
        #[dynamap(base)]
        base: BaseFields,

        #[dynamap(attr = "_id")]
        id: String,
    }

    #[test]
    fn get_reads_declared_and_base_fields() {
        let mut note = Note::default();
        note.title = "hello".into();
        note.base.deleted = true;

        assert_eq!(get(&note, "title"), Ok(Value::Text("hello".into())));
        assert_eq!(get(&note, "deleted"), Ok(Value::Bool(true)));
        assert_eq!(
            get(&note, "missing"),
            Err(AccessError::FieldNotFound("missing".into()))
        );
        assert_eq!(
            get(&note, "missing").unwrap_err().to_string(),
            "field with name 'missing' not found"
        );
    }

    #[test]
    fn set_round_trips() {
        let mut note = Note::default();

        assert!(set(&mut note, "words", Value::Uint(12)));
        assert!(set(&mut note, "id", Value::Text("n-1".into())));
        assert_eq!(get(&note, "words"), Ok(Value::Uint(12)));
        assert_eq!(note.base.id, "n-1");

        assert!(!set(&mut note, "nope", Value::Null));
    }

    #[test]
    fn set_type_checks() {
        let mut note = Note::default();
        note.words = 5;

        let err = try_set(&mut note, "words", Value::Text("many".into())).unwrap_err();

        assert!(matches!(err, AccessError::Value { ref field, .. } if field == "words"));
        assert_eq!(note.words, 5);
        assert!(!set(&mut note, "words", Value::Int(-1)));
        assert_eq!(note.words, 5);
    }

    #[test]
    fn set_rejects_values_that_read_back_differently() {
        let mut note = Note::default();
        note.words = 5;

        let err = try_set(&mut note, "words", Value::Int(9)).unwrap_err();
        assert_eq!(
            err,
            AccessError::Altered {
                field: "words".into(),
                written: "int",
                stored: "uint",
            }
        );
        assert_eq!(note.words, 5);

        let offset = Value::Text("2024-03-01T12:30:00+02:00".into());
        assert!(!set(&mut note, "created_at", offset));
        assert!(note.base.created_at.is_zero());

        let stamp = Value::Timestamp(Timestamp::from_unix_seconds(60).unwrap());
        assert!(set(&mut note, "created_at", stamp.clone()));
        assert_eq!(get(&note, "created_at"), Ok(stamp));
    }

    #[test]
    fn set_accepts_sets_in_any_order() {
        #[derive(Debug, Default, Record)]
        struct Tagged {
            #[dynamap(base)]
            base: BaseFields,

            #[dynamap(attr = "tags")]
            tags: std::collections::BTreeSet<String>,
        }

        let mut tagged = Tagged::default();
        let unordered = Value::Set(vec![Value::Text("b".into()), Value::Text("a".into())]);

        assert!(set(&mut tagged, "tags", unordered));
        assert_eq!(tagged.tags.len(), 2);
    }

    #[test]
    fn declared_identity_shadows_base() {
        let mut counter = Counter::default();
        counter.base.id = "base".into();

        assert!(set(&mut counter, "id", Value::Uint(7)));
        assert_eq!(counter.id, 7);
        assert_eq!(counter.base.id, "base");

        let item = marshal(&counter, &Encoder::default()).unwrap();
        assert_eq!(item["id"], AttributeValue::N("7".into()));
    }

    #[test]
    fn empty_base_only_marshal() {
        #[derive(Debug, Default, Record)]
        struct Bare {
            #[dynamap(base)]
            base: BaseFields,
        }

        let item = marshal(&Bare::default(), &Encoder::default()).unwrap();

        assert_eq!(item.len(), 3);
        assert_eq!(item["id"], AttributeValue::S(String::new()));
        assert_eq!(item["c_at"], AttributeValue::S("0001-01-01T00:00:00Z".into()));
        assert_eq!(item["u_at"], AttributeValue::S("0001-01-01T00:00:00Z".into()));
        assert!(!item.contains_key("deleted"));
    }

    #[test]
    fn excluded_redeclaration_keeps_base_attribute() {
        #[derive(Debug, Default, Record)]
        struct Hidden {
            #[dynamap(base)]
            base: BaseFields,

            #[dynamap(attr = "-")]
            id: String,

            deleted: bool,
        }

        let mut hidden = Hidden::default();
        hidden.base.id = "h-1".into();
        hidden.base.deleted = true;
        hidden.id = "local".into();

        let item = marshal(&hidden, &Encoder::default()).unwrap();

        assert_eq!(item["id"], AttributeValue::S("h-1".into()));
        assert_eq!(item["deleted"], AttributeValue::Bool(true));
    }

    #[test]
    fn renamed_identity_drops_base_attribute() {
        let mut renamed = Renamed::default();
        renamed.id = "r-1".into();

        let item = marshal(&renamed, &Encoder::default()).unwrap();

        assert_eq!(item["_id"], AttributeValue::S("r-1".into()));
        assert!(!item.contains_key("id"));
    }
}
