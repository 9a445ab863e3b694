//! The store boundary. The core never talks to a network client directly;
//! tables call through the `Session` trait.

mod memory;

pub use memory::MemorySession;

use crate::{
    schema::{AttributeDefinition, KeySchemaElement, Schema, SecondaryIndex, Throughput},
    wire::Item,
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use thiserror::Error as ThisError;

///
/// SessionError
///

#[derive(Debug, ThisError)]
pub enum SessionError {
    #[error("session backend error: {0}")]
    Backend(String),

    #[error("item for table '{table}' is missing key attribute '{attribute}'")]
    MissingKey { table: String, attribute: String },

    #[error("session already attached")]
    AlreadyAttached,

    #[error("table '{0}' already exists")]
    TableExists(String),

    #[error("table '{0}' not found")]
    TableNotFound(String),
}

///
/// CreateTableRequest
///
/// Attribute definitions carry key attributes only; the store rejects
/// definitions that no key schema references.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct CreateTableRequest {
    pub table_name: String,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
    pub secondary_indexes: Vec<SecondaryIndex>,
    pub throughput: Throughput,
}

impl CreateTableRequest {
    #[must_use]
    pub fn from_schema(table_name: &str, schema: &Schema, throughput: Throughput) -> Self {
        Self {
            table_name: table_name.to_string(),
            attribute_definitions: schema.key_attribute_definitions(),
            key_schema: schema.key_schema.clone(),
            secondary_indexes: schema.secondary_indexes.clone(),
            throughput,
        }
    }
}

///
/// TableStatus
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    Active,
    Deleting,
}

///
/// TableDescription
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableDescription {
    pub table_name: String,
    pub status: TableStatus,
    pub attribute_definitions: Vec<AttributeDefinition>,
    pub key_schema: Vec<KeySchemaElement>,
    pub secondary_indexes: Vec<SecondaryIndex>,
    pub item_count: usize,
}

///
/// Session
///

pub trait Session: Send + Sync {
    fn create_table(&self, request: CreateTableRequest) -> Result<TableDescription, SessionError>;

    fn delete_table(&self, table_name: &str) -> Result<TableDescription, SessionError>;

    fn put_item(&self, table_name: &str, item: Item) -> Result<(), SessionError>;
}

///
/// SessionSlot
///
/// Set-once session cell shared by a registry and every table it creates,
/// so a session attached after registration still reaches those tables.
///

#[derive(Clone, Default)]
pub struct SessionSlot(Arc<OnceLock<Arc<dyn Session>>>);

impl SessionSlot {
    #[must_use]
    pub fn with(session: Arc<dyn Session>) -> Self {
        let slot = Self::default();
        let _ = slot.0.set(session);

        slot
    }

    pub fn attach(&self, session: Arc<dyn Session>) -> Result<(), SessionError> {
        self.0.set(session).map_err(|_| SessionError::AlreadyAttached)
    }

    #[must_use]
    pub fn get(&self) -> Option<&Arc<dyn Session>> {
        self.0.get()
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.0.get().is_some()
    }
}

impl std::fmt::Debug for SessionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SessionSlot")
            .field(&self.is_attached())
            .finish()
    }
}
