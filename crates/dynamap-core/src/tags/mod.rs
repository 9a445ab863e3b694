//! Tag parser: turns one field's raw `#[dynamap(...)]` strings into a
//! `FieldDirective`.
//!
//! Lenient mode never fails; anything it cannot read is logged and dropped.
//! Strict mode reports the same conditions as `MetadataError`.


use crate::{
    IGNORE_SENTINELS,
    config::MetadataMode,
    model::FieldSchema,
    schema::{KeyRole, ProjectionMode},
    wire::WireType,
};
use thiserror::Error as ThisError;

///
/// MetadataError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[remain::sorted]
pub enum MetadataError {
    #[error("key role {role:?} declared by both '{first}' and '{second}'")]
    DuplicateKeyRole {
        role: KeyRole,
        first: String,
        second: String,
    },

    #[error("field '{field}': index annotation has an empty index name")]
    EmptyIndexName { field: &'static str },

    #[error("index '{index}' has no partition key")]
    IndexWithoutPartitionKey { index: String },

    #[error("field '{field}' exceeds the maximum nesting depth of {depth}")]
    NestingTooDeep { field: &'static str, depth: usize },

    #[error("key attribute '{attribute}' has non-scalar wire type {wire_type}")]
    NonScalarKey {
        attribute: String,
        wire_type: WireType,
    },

    #[error("field '{field}': index '{index}' has unexpected trailing token '{token}'")]
    TrailingIndexTokens {
        field: &'static str,
        index: String,
        token: String,
    },

    #[error("field '{field}': unknown index role '{token}' for index '{index}'")]
    UnknownIndexRole {
        field: &'static str,
        index: String,
        token: String,
    },

    #[error("field '{field}': unknown key role '{token}'")]
    UnknownKeyRole { field: &'static str, token: String },

    #[error("field '{field}': unknown option '{option}'")]
    UnknownOption { field: &'static str, option: String },

    #[error("field '{field}': unknown projection '{token}' for index '{index}'")]
    UnknownProjection {
        field: &'static str,
        index: String,
        token: String,
    },

    #[error("field '{field}': unknown wire type '{token}'")]
    UnknownWireType { field: &'static str, token: String },
}

/// Report `err` in strict mode; log and swallow it in lenient mode.
pub(crate) fn degrade(mode: MetadataMode, err: MetadataError) -> Result<(), MetadataError> {
    if mode.is_strict() {
        return Err(err);
    }
    tracing::warn!(error = %err, "ignoring malformed metadata");

    Ok(())
}

///
/// FieldOptions
/// Trailing segments of the `attr` annotation.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FieldOptions {
    pub omit_empty: bool,
    pub unix_time: bool,

    /// `stringset` / `numberset` / `binaryset`
    pub set_type: Option<WireType>,
}

///
/// IndexRole
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IndexRole {
    Include,
    Partition,
    Sort,
}

impl IndexRole {
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("include") {
            Some(Self::Include)
        } else {
            KeyRole::from_token(token).map(Self::from)
        }
    }

    #[must_use]
    pub const fn key_role(self) -> Option<KeyRole> {
        match self {
            Self::Partition => Some(KeyRole::Partition),
            Self::Sort => Some(KeyRole::Sort),
            Self::Include => None,
        }
    }
}

impl From<KeyRole> for IndexRole {
    fn from(role: KeyRole) -> Self {
        match role {
            KeyRole::Partition => Self::Partition,
            KeyRole::Sort => Self::Sort,
        }
    }
}

///
/// IndexMembership
/// One `index = "..."` annotation.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IndexMembership {
    pub index_name: String,
    pub role: Option<IndexRole>,
    pub read_hint: u64,
    pub write_hint: u64,
    pub projection: Option<ProjectionMode>,
}

///
/// FieldDirective
///
/// Everything the schema deriver and encoder need to know about one field.
/// `storage_name == None` means the field is excluded from schema and
/// serialization; it is still reachable through get/set. Nested records
/// discard their own name, so only an explicit `-`, `_` or empty name
/// (`ignored`) excludes them.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FieldDirective {
    pub storage_name: Option<String>,
    pub ignored: bool,
    pub options: FieldOptions,
    pub explicit_type: Option<WireType>,
    pub key_role: Option<KeyRole>,
    pub indexes: Vec<IndexMembership>,
}

impl FieldDirective {
    #[must_use]
    pub const fn is_excluded(&self) -> bool {
        self.storage_name.is_none()
    }

    /// Explicit type, or the type inferred from the field's kind.
    /// `None` for nested records without an override.
    #[must_use]
    pub fn wire_type(&self, field: &FieldSchema) -> Option<WireType> {
        self.explicit_type
            .or_else(|| field.kind.inferred_wire_type(self.options.unix_time))
    }

    /// Whether the field is a nested record to be flattened into its parent.
    #[must_use]
    pub fn is_flattened(&self, field: &FieldSchema) -> bool {
        !self.ignored && self.explicit_type.is_none() && field.kind.is_record()
    }

    /// Whether the field contributes nothing to schema or wire output.
    #[must_use]
    pub fn is_skipped(&self, field: &FieldSchema) -> bool {
        self.is_excluded() && !self.is_flattened(field)
    }
}

///
/// parse
///

pub fn parse(field: &FieldSchema, mode: MetadataMode) -> Result<FieldDirective, MetadataError> {
    let tags = &field.tags;
    let mut directive = FieldDirective::default();

    if let Some(attr) = tags.attr {
        let mut segments = attr.split(',');
        let name = segments.next().unwrap_or_default().trim();

        if name.is_empty() || IGNORE_SENTINELS.contains(&name) {
            directive.ignored = true;
        } else {
            directive.storage_name = Some(name.to_string());
        }
        for option in segments.map(str::trim).filter(|s| !s.is_empty()) {
            parse_option(field.ident, option, &mut directive.options, mode)?;
        }
    }

    directive.explicit_type = match tags.wire {
        Some(token) => {
            let ty = WireType::from_token(token);
            if ty.is_none() {
                degrade(
                    mode,
                    MetadataError::UnknownWireType {
                        field: field.ident,
                        token: token.to_string(),
                    },
                )?;
            }
            ty
        }
        None => None,
    }
    .or(directive.options.set_type);

    if let Some(token) = tags.key {
        directive.key_role = KeyRole::from_token(token);
        if directive.key_role.is_none() {
            degrade(
                mode,
                MetadataError::UnknownKeyRole {
                    field: field.ident,
                    token: token.to_string(),
                },
            )?;
        }
    }

    for raw in tags.indexes {
        if let Some(membership) = parse_index(field.ident, raw, mode)? {
            directive.indexes.push(membership);
        }
    }

    Ok(directive)
}

fn parse_option(
    field: &'static str,
    option: &str,
    options: &mut FieldOptions,
    mode: MetadataMode,
) -> Result<(), MetadataError> {
    match option.to_ascii_lowercase().as_str() {
        "omitempty" => options.omit_empty = true,
        "unixtime" => options.unix_time = true,
        "stringset" => options.set_type = Some(WireType::StringSet),
        "numberset" => options.set_type = Some(WireType::NumberSet),
        "binaryset" => options.set_type = Some(WireType::BinarySet),
        _ => degrade(
            mode,
            MetadataError::UnknownOption {
                field,
                option: option.to_string(),
            },
        )?,
    }

    Ok(())
}

/// `indexName,role[,readHint[,writeHint]][,projection]`
///
/// Missing trailing parts default to zero / none. An empty index name
/// drops the membership.
pub fn parse_index(
    field: &'static str,
    raw: &str,
    mode: MetadataMode,
) -> Result<Option<IndexMembership>, MetadataError> {
    let mut tokens = raw.split(',').map(str::trim);

    let index_name = tokens.next().unwrap_or_default();
    if index_name.is_empty() {
        degrade(mode, MetadataError::EmptyIndexName { field })?;
        return Ok(None);
    }

    let mut membership = IndexMembership {
        index_name: index_name.to_string(),
        role: None,
        read_hint: 0,
        write_hint: 0,
        projection: None,
    };

    let role_token = tokens.next().unwrap_or_default();
    membership.role = IndexRole::from_token(role_token);
    if membership.role.is_none() {
        degrade(
            mode,
            MetadataError::UnknownIndexRole {
                field,
                index: membership.index_name.clone(),
                token: role_token.to_string(),
            },
        )?;
    }

    let mut hints = 0;
    for token in tokens {
        if membership.projection.is_none() && hints < 2 {
            let hint = if token.is_empty() {
                Some(0)
            } else {
                token.parse::<u64>().ok()
            };
            if let Some(hint) = hint {
                if hints == 0 {
                    membership.read_hint = hint;
                } else {
                    membership.write_hint = hint;
                }
                hints += 1;
                continue;
            }
        }

        let projection = if membership.projection.is_none() {
            ProjectionMode::from_token(token)
        } else {
            None
        };
        match projection {
            Some(projection) => membership.projection = Some(projection),
            None if membership.projection.is_some() || token.parse::<u64>().is_ok() => degrade(
                mode,
                MetadataError::TrailingIndexTokens {
                    field,
                    index: membership.index_name.clone(),
                    token: token.to_string(),
                },
            )?,
            None => degrade(
                mode,
                MetadataError::UnknownProjection {
                    field,
                    index: membership.index_name.clone(),
                    token: token.to_string(),
                },
            )?,
        }
    }

    Ok(Some(membership))
}
