use crate::{
    IDENTITY_ATTRIBUTE, IDENTITY_FIELD,
    config::Config,
    model::{BaseFields, FieldKind, FieldSchema},
    schema::{
        AttributeDefinition, KeyRole, KeySchemaElement, ProjectionMode, Schema, SecondaryIndex,
        Throughput,
    },
    tags::{self, IndexMembership, IndexRole, MetadataError, degrade},
    traits::{Fields, Record},
    wire::WireType,
};
use std::collections::BTreeMap;

///
/// Entry
/// One resolved field, keyed by its declared identifier.
///

#[derive(Clone, Debug)]
struct Entry {
    ident: &'static str,
    storage_name: String,
    wire_type: WireType,
    key_role: Option<KeyRole>,
    indexes: Vec<IndexMembership>,
}

///
/// Entries
/// Ordered entry list where a later insert replaces any entry with the same
/// identifier and moves to the end.
///

#[derive(Debug, Default)]
struct Entries(Vec<Entry>);

impl Entries {
    fn insert(&mut self, entry: Entry) {
        self.0.retain(|e| e.ident != entry.ident);
        self.0.push(entry);
    }

    fn overlay(&mut self, other: Self) {
        for entry in other.0 {
            self.insert(entry);
        }
    }
}

/// Derive the table schema for `R`: its base fields first, then its own.
pub fn derive_schema<R: Record>(config: &Config) -> Result<Schema, MetadataError> {
    derive_from_tables(BaseFields::SCHEMA, R::SCHEMA, config)
}

/// Derive a schema from a base table and a declared table. Declared entries
/// override base entries with the same identifier.
pub fn derive_from_tables(
    base: &[FieldSchema],
    declared: &[FieldSchema],
    config: &Config,
) -> Result<Schema, MetadataError> {
    let mut entries = collect(base, 0, config)?;
    entries.overlay(collect(declared, 0, config)?);

    let schema = assemble(entries.0, config)?;
    tracing::debug!(
        attributes = schema.attribute_definitions.len(),
        keys = schema.key_schema.len(),
        indexes = schema.secondary_indexes.len(),
        "derived schema"
    );

    Ok(schema)
}

// Nested records contribute first; the declaring type's own fields then
// override them.
fn collect(fields: &[FieldSchema], depth: usize, config: &Config) -> Result<Entries, MetadataError> {
    let mut inner = Entries::default();
    let mut own = Entries::default();

    for field in fields {
        let directive = tags::parse(field, config.metadata)?;

        if directive.is_flattened(field) {
            let FieldKind::Record { fields: nested, .. } = field.kind else {
                continue;
            };
            if depth + 1 > config.max_nesting_depth {
                degrade(
                    config.metadata,
                    MetadataError::NestingTooDeep {
                        field: field.ident,
                        depth: config.max_nesting_depth,
                    },
                )?;
                continue;
            }
            inner.overlay(collect(nested(), depth + 1, config)?);
            continue;
        }

        let Some(wire_type) = directive.wire_type(field) else {
            continue;
        };
        let Some(storage_name) = directive.storage_name else {
            continue;
        };

        own.insert(Entry {
            ident: field.ident,
            storage_name,
            wire_type,
            key_role: directive.key_role,
            indexes: directive.indexes,
        });
    }

    inner.overlay(own);

    Ok(inner)
}

fn assemble(entries: Vec<Entry>, config: &Config) -> Result<Schema, MetadataError> {
    let mode = config.metadata;

    let mut definitions: BTreeMap<String, WireType> = entries
        .iter()
        .map(|e| (e.storage_name.clone(), e.wire_type))
        .collect();

    // table key
    let mut partition: Option<&Entry> = None;
    let mut sort: Option<&Entry> = None;
    for entry in &entries {
        let slot = match entry.key_role {
            Some(KeyRole::Partition) => &mut partition,
            Some(KeyRole::Sort) => &mut sort,
            None => continue,
        };
        if let Some(first) = slot.replace(entry) {
            degrade(
                mode,
                MetadataError::DuplicateKeyRole {
                    role: entry.key_role.unwrap_or(KeyRole::Partition),
                    first: first.ident.to_string(),
                    second: entry.ident.to_string(),
                },
            )?;
        }
    }

    // no declared partition key: fall back to the identity field, which is
    // synthesized when it was excluded or never declared
    let partition_name = match partition {
        Some(entry) => entry.storage_name.clone(),
        None => {
            let identity = entries.iter().find(|e| e.ident == IDENTITY_FIELD);
            match identity {
                Some(entry) => entry.storage_name.clone(),
                None => {
                    definitions.insert(IDENTITY_ATTRIBUTE.to_string(), WireType::String);
                    IDENTITY_ATTRIBUTE.to_string()
                }
            }
        }
    };

    let mut key_schema = vec![KeySchemaElement::new(partition_name, KeyRole::Partition)];
    if let Some(entry) = sort {
        key_schema.push(KeySchemaElement::new(entry.storage_name.clone(), KeyRole::Sort));
    }

    let secondary_indexes = assemble_indexes(&entries, config)?;

    let attribute_definitions: Vec<_> = definitions
        .into_iter()
        .map(|(name, wire_type)| AttributeDefinition::new(name, wire_type))
        .collect();

    if mode.is_strict() {
        let key_elements = key_schema
            .iter()
            .chain(secondary_indexes.iter().flat_map(|i| &i.key_schema));

        for element in key_elements {
            let wire_type = attribute_definitions
                .iter()
                .find(|a| a.name == element.attribute_name)
                .map_or(WireType::String, |a| a.wire_type);

            if !wire_type.is_key_scalar() {
                return Err(MetadataError::NonScalarKey {
                    attribute: element.attribute_name.clone(),
                    wire_type,
                });
            }
        }
    }

    Ok(Schema {
        attribute_definitions,
        key_schema,
        secondary_indexes,
    })
}

///
/// IndexBuilder
///

#[derive(Debug, Default)]
struct IndexBuilder {
    partition: Option<String>,
    sort: Option<String>,
    includes: Vec<String>,
    projection: Option<ProjectionMode>,
    read: u64,
    write: u64,
}

impl IndexBuilder {
    fn build(self, name: String) -> SecondaryIndex {
        let projection = self.projection.unwrap_or(if self.includes.is_empty() {
            ProjectionMode::All
        } else {
            ProjectionMode::Include
        });

        let mut key_schema = Vec::with_capacity(2);
        if let Some(attr) = self.partition {
            key_schema.push(KeySchemaElement::new(attr, KeyRole::Partition));
        }
        if let Some(attr) = self.sort {
            key_schema.push(KeySchemaElement::new(attr, KeyRole::Sort));
        }

        let non_key_attributes = if projection == ProjectionMode::Include {
            self.includes
        } else {
            Vec::new()
        };

        let throughput =
            (self.read > 0 || self.write > 0).then(|| Throughput::new(self.read, self.write));

        SecondaryIndex {
            name,
            key_schema,
            projection,
            non_key_attributes,
            throughput,
        }
    }
}

fn assemble_indexes(entries: &[Entry], config: &Config) -> Result<Vec<SecondaryIndex>, MetadataError> {
    let mode = config.metadata;
    let mut builders: BTreeMap<String, IndexBuilder> = BTreeMap::new();

    for entry in entries {
        for membership in &entry.indexes {
            let builder = builders.entry(membership.index_name.clone()).or_default();
            let attr = entry.storage_name.clone();

            match membership.role {
                Some(IndexRole::Include) => {
                    if !builder.includes.contains(&attr) {
                        builder.includes.push(attr);
                    }
                }
                Some(role) => {
                    let (slot, key_role) = match role {
                        IndexRole::Sort => (&mut builder.sort, KeyRole::Sort),
                        _ => (&mut builder.partition, KeyRole::Partition),
                    };
                    if let Some(first) = slot.replace(attr) {
                        degrade(
                            mode,
                            MetadataError::DuplicateKeyRole {
                                role: key_role,
                                first,
                                second: entry.storage_name.clone(),
                            },
                        )?;
                    }
                }
                None => {}
            }

            if membership.projection.is_some() {
                builder.projection = membership.projection;
            }
            builder.read = builder.read.max(membership.read_hint);
            builder.write = builder.write.max(membership.write_hint);
        }
    }

    let mut indexes = Vec::with_capacity(builders.len());
    for (name, builder) in builders {
        if builder.partition.is_none() {
            degrade(
                mode,
                MetadataError::IndexWithoutPartitionKey { index: name.clone() },
            )?;
            continue;
        }
        indexes.push(builder.build(name));
    }

    Ok(indexes)
}
