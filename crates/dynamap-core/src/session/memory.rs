use crate::{
    session::{CreateTableRequest, Session, SessionError, TableDescription, TableStatus},
    wire::{AttributeValue, Item},
};
use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard},
};

///
/// MemoryTable
///

#[derive(Debug)]
struct MemoryTable {
    request: CreateTableRequest,
    items: BTreeMap<Vec<String>, Item>,
}

impl MemoryTable {
    fn describe(&self, status: TableStatus) -> TableDescription {
        TableDescription {
            table_name: self.request.table_name.clone(),
            status,
            attribute_definitions: self.request.attribute_definitions.clone(),
            key_schema: self.request.key_schema.clone(),
            secondary_indexes: self.request.secondary_indexes.clone(),
            item_count: self.items.len(),
        }
    }

    // Items are keyed by the rendered values of their key attributes.
    fn item_key(&self, item: &Item) -> Result<Vec<String>, SessionError> {
        self.request
            .key_schema
            .iter()
            .map(|element| {
                item.get(&element.attribute_name)
                    .and_then(render_key)
                    .ok_or_else(|| SessionError::MissingKey {
                        table: self.request.table_name.clone(),
                        attribute: element.attribute_name.clone(),
                    })
            })
            .collect()
    }
}

fn render_key(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::S(s) => Some(format!("S:{s}")),
        AttributeValue::N(n) => Some(format!("N:{n}")),
        AttributeValue::B(b) => Some(format!("B:{b:?}")),
        _ => None,
    }
}

///
/// MemorySession
///
/// In-process `Session` for tests and local tools. Items are replaced on
/// put by primary key; nothing is persisted.
///

#[derive(Debug, Default)]
pub struct MemorySession {
    tables: Mutex<BTreeMap<String, MemoryTable>>,
}

impl MemorySession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, MemoryTable>>, SessionError> {
        self.tables
            .lock()
            .map_err(|_| SessionError::Backend("memory session lock poisoned".to_string()))
    }

    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        self.lock()
            .map(|tables| tables.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn describe(&self, table_name: &str) -> Result<TableDescription, SessionError> {
        let tables = self.lock()?;
        tables
            .get(table_name)
            .map(|t| t.describe(TableStatus::Active))
            .ok_or_else(|| SessionError::TableNotFound(table_name.to_string()))
    }

    /// Snapshot of every stored item in key order.
    pub fn items(&self, table_name: &str) -> Result<Vec<Item>, SessionError> {
        let tables = self.lock()?;
        tables
            .get(table_name)
            .map(|t| t.items.values().cloned().collect())
            .ok_or_else(|| SessionError::TableNotFound(table_name.to_string()))
    }
}

impl Session for MemorySession {
    fn create_table(&self, request: CreateTableRequest) -> Result<TableDescription, SessionError> {
        let mut tables = self.lock()?;
        if tables.contains_key(&request.table_name) {
            return Err(SessionError::TableExists(request.table_name));
        }

        let table = MemoryTable {
            request,
            items: BTreeMap::new(),
        };
        let description = table.describe(TableStatus::Active);
        tables.insert(description.table_name.clone(), table);

        Ok(description)
    }

    fn delete_table(&self, table_name: &str) -> Result<TableDescription, SessionError> {
        let mut tables = self.lock()?;

        tables
            .remove(table_name)
            .map(|t| t.describe(TableStatus::Deleting))
            .ok_or_else(|| SessionError::TableNotFound(table_name.to_string()))
    }

    fn put_item(&self, table_name: &str, item: Item) -> Result<(), SessionError> {
        let mut tables = self.lock()?;
        let table = tables
            .get_mut(table_name)
            .ok_or_else(|| SessionError::TableNotFound(table_name.to_string()))?;

        let key = table.item_key(&item)?;
        table.items.insert(key, item);

        Ok(())
    }
}

///
/// TESTS
///
