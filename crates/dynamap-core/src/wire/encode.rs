use crate::{
    config::{Config, MetadataMode},
    tags::{self, MetadataError, degrade},
    value::{RecordValue, Value},
    wire::{AttributeValue, Item, WireType},
};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error as ThisError;

///
/// EncodingError
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum EncodingError {
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("field '{field}': set mixes {expected} and {found} elements")]
    MixedSet {
        field: &'static str,
        expected: WireType,
        found: &'static str,
    },

    #[error("field '{field}': non-finite number {value}")]
    NonFiniteNumber { field: &'static str, value: f64 },

    #[error("field '{field}': cannot encode {found} value as {wire_type}")]
    Unsupported {
        field: &'static str,
        wire_type: WireType,
        found: &'static str,
    },
}

///
/// Encoder
///
/// Turns captured record values into wire items, following the same field
/// directives the schema deriver reads.
///

#[derive(Clone, Copy, Debug)]
pub struct Encoder {
    mode: MetadataMode,
    null_empty_string: bool,
    max_nesting_depth: usize,
}

impl Encoder {
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            mode: config.metadata,
            null_empty_string: config.encoding.null_empty_string,
            max_nesting_depth: config.max_nesting_depth,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> MetadataMode {
        self.mode
    }

    /// Encode every serialized field of `record` into a flat item.
    /// Nested records without an explicit type are flattened; the record's
    /// own attributes override flattened ones with the same name.
    pub fn encode_record(&self, record: &RecordValue) -> Result<Item, EncodingError> {
        self.encode_level(record, 0)
    }

    fn encode_level(&self, record: &RecordValue, depth: usize) -> Result<Item, EncodingError> {
        let mut inner = Item::new();
        let mut own = Item::new();

        for field in record.schema() {
            let directive = tags::parse(field, self.mode)?;
            let Some(value) = record.get(field.ident) else {
                continue;
            };

            if directive.is_flattened(field) {
                match value {
                    Value::Record(nested) if depth < self.max_nesting_depth => {
                        inner.extend(self.encode_level(nested, depth + 1)?);
                    }
                    Value::Record(_) => degrade(
                        self.mode,
                        MetadataError::NestingTooDeep {
                            field: field.ident,
                            depth: self.max_nesting_depth,
                        },
                    )?,
                    Value::Null => {}
                    other => {
                        return Err(EncodingError::Unsupported {
                            field: field.ident,
                            wire_type: WireType::Map,
                            found: other.kind_name(),
                        });
                    }
                }
                continue;
            }

            let Some(name) = directive.storage_name else {
                continue;
            };
            if directive.options.omit_empty && value.is_empty_like() {
                continue;
            }

            let attr = self.encode_field(
                field.ident,
                value,
                directive.explicit_type,
                directive.options.unix_time,
            )?;
            own.insert(name, attr);
        }

        inner.extend(own);

        Ok(inner)
    }

    /// Encode one field value, honouring an explicit wire type if present.
    pub fn encode_field(
        &self,
        field: &'static str,
        value: &Value,
        explicit: Option<WireType>,
        unix_time: bool,
    ) -> Result<AttributeValue, EncodingError> {
        let Some(wire_type) = explicit else {
            return self.encode_value(field, value, unix_time);
        };

        match value {
            Value::Null => Ok(AttributeValue::Null(true)),
            Value::List(items) | Value::Set(items) if wire_type.is_set() => {
                self.encode_set(field, items, Some(wire_type))
            }
            Value::List(items) | Value::Set(items) if wire_type == WireType::List => {
                self.encode_list(field, items)
            }
            Value::Timestamp(ts) => match wire_type {
                WireType::Number => Ok(AttributeValue::N(ts.unix_seconds().to_string())),
                WireType::String => Ok(AttributeValue::S(ts.to_rfc3339())),
                _ => Err(unsupported(field, wire_type, value)),
            },
            _ => {
                let encoded = self.encode_value(field, value, unix_time)?;
                if encoded.wire_type() == wire_type {
                    Ok(encoded)
                } else {
                    Err(unsupported(field, wire_type, value))
                }
            }
        }
    }

    /// Encode a value by its natural mapping.
    pub fn encode_value(
        &self,
        field: &'static str,
        value: &Value,
        unix_time: bool,
    ) -> Result<AttributeValue, EncodingError> {
        let attr = match value {
            Value::Null => AttributeValue::Null(true),
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Int(n) => AttributeValue::N(n.to_string()),
            Value::Uint(n) => AttributeValue::N(n.to_string()),
            Value::Float(f) => AttributeValue::N(number(field, *f)?),
            Value::Text(s) if s.is_empty() && self.null_empty_string => AttributeValue::Null(true),
            Value::Text(s) => AttributeValue::S(s.clone()),
            Value::Blob(bytes) => AttributeValue::B(bytes.clone()),
            Value::Timestamp(ts) if unix_time => AttributeValue::N(ts.unix_seconds().to_string()),
            Value::Timestamp(ts) => AttributeValue::S(ts.to_rfc3339()),
            Value::List(items) => self.encode_list(field, items)?,
            Value::Set(items) => self.encode_set(field, items, None)?,
            Value::Map(entries) => AttributeValue::M(self.encode_map(field, entries)?),
            Value::Record(record) => AttributeValue::M(self.encode_record(record)?),
        };

        Ok(attr)
    }

    fn encode_list(
        &self,
        field: &'static str,
        items: &[Value],
    ) -> Result<AttributeValue, EncodingError> {
        items
            .iter()
            .map(|item| self.encode_value(field, item, false))
            .collect::<Result<_, _>>()
            .map(AttributeValue::L)
    }

    fn encode_map(
        &self,
        field: &'static str,
        entries: &BTreeMap<String, Value>,
    ) -> Result<HashMap<String, AttributeValue>, EncodingError> {
        entries
            .iter()
            .map(|(k, v)| Ok((k.clone(), self.encode_value(field, v, false)?)))
            .collect()
    }

    /// Homogeneous sets of strings, numbers or blobs become SS / NS / BS.
    /// Without a declared set type, sets of anything else become lists.
    /// The store has no empty set, so an empty one is written as NULL.
    fn encode_set(
        &self,
        field: &'static str,
        items: &[Value],
        declared: Option<WireType>,
    ) -> Result<AttributeValue, EncodingError> {
        let Some(first) = items.first() else {
            return Ok(AttributeValue::Null(true));
        };

        let Some(set_type) = declared.or_else(|| set_type_of(first)) else {
            return self.encode_list(field, items);
        };

        for item in items {
            if set_type_of(item) != Some(set_type) {
                return Err(EncodingError::MixedSet {
                    field,
                    expected: set_type,
                    found: item.kind_name(),
                });
            }
        }

        let attr = match set_type {
            WireType::StringSet => AttributeValue::Ss(
                items
                    .iter()
                    .filter_map(Value::as_text)
                    .map(str::to_string)
                    .collect(),
            ),
            WireType::NumberSet => AttributeValue::Ns(
                items
                    .iter()
                    .map(|item| match item {
                        Value::Float(f) => number(field, *f),
                        Value::Int(n) => Ok(n.to_string()),
                        Value::Uint(n) => Ok(n.to_string()),
                        other => Err(unsupported(field, set_type, other)),
                    })
                    .collect::<Result<_, _>>()?,
            ),
            _ => AttributeValue::Bs(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Blob(bytes) => Some(bytes.clone()),
                        _ => None,
                    })
                    .collect(),
            ),
        };

        Ok(attr)
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

const fn set_type_of(value: &Value) -> Option<WireType> {
    match value {
        Value::Text(_) => Some(WireType::StringSet),
        Value::Int(_) | Value::Uint(_) | Value::Float(_) => Some(WireType::NumberSet),
        Value::Blob(_) => Some(WireType::BinarySet),
        _ => None,
    }
}

fn number(field: &'static str, value: f64) -> Result<String, EncodingError> {
    if value.is_finite() {
        Ok(value.to_string())
    } else {
        Err(EncodingError::NonFiniteNumber { field, value })
    }
}

fn unsupported(field: &'static str, wire_type: WireType, value: &Value) -> EncodingError {
    EncodingError::Unsupported {
        field,
        wire_type,
        found: value.kind_name(),
    }
}
