use crate::{
    model::{FieldAccessor, FieldKind, FieldSchema, FieldTags},
    traits::{FieldValue, Fields},
    types::Timestamp,
    value::Value,
};

///
/// BaseFields
///
/// Identity and audit fields every record carries. Records embed it as a
/// named `#[dynamap(base)]` member; its fields are merged ahead of the
/// record's own, so a record can redeclare any of them.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BaseFields {
    pub id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted: bool,
}

impl BaseFields {
    /// Stamp audit times for a write at `now`.
    pub fn touch(&mut self, now: Timestamp) {
        if self.created_at.is_zero() {
            self.created_at = now;
        }
        self.updated_at = now;
    }
}

impl Fields for BaseFields {
    const PATH: &'static str = "dynamap::model::BaseFields";

    const SCHEMA: &'static [FieldSchema] = &[
        FieldSchema::new("id", FieldTags::attr("id"), FieldKind::Text),
        FieldSchema::new("created_at", FieldTags::attr("c_at"), FieldKind::Timestamp),
        FieldSchema::new("updated_at", FieldTags::attr("u_at"), FieldKind::Timestamp),
        FieldSchema::new(
            "deleted",
            FieldTags::attr("deleted,omitempty"),
            FieldKind::Bool,
        ),
    ];

    const ACCESSORS: &'static [FieldAccessor<Self>] = &[
        FieldAccessor {
            ident: "id",
            get: |b| Value::Text(b.id.clone()),
            set: |b, v| {
                b.id = FieldValue::from_value(v)?;
                Ok(())
            },
        },
        FieldAccessor {
            ident: "created_at",
            get: |b| Value::Timestamp(b.created_at),
            set: |b, v| {
                b.created_at = FieldValue::from_value(v)?;
                Ok(())
            },
        },
        FieldAccessor {
            ident: "updated_at",
            get: |b| Value::Timestamp(b.updated_at),
            set: |b, v| {
                b.updated_at = FieldValue::from_value(v)?;
                Ok(())
            },
        },
        FieldAccessor {
            ident: "deleted",
            get: |b| Value::Bool(b.deleted),
            set: |b, v| {
                b.deleted = FieldValue::from_value(v)?;
                Ok(())
            },
        },
    ];
}

///
/// TESTS
///
