use crate::{
    Error,
    config::Config,
    schema::{self, Schema},
    session::{Session, SessionSlot, TableDescription},
    table::{Table, TableEntry},
    traits::Record,
};
use std::{
    any::TypeId,
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, PoisonError},
};
use thiserror::Error as ThisError;

///
/// RegistryError
///

#[derive(Debug, ThisError)]
pub enum RegistryError {
    #[error("a session is already attached to this registry")]
    SessionAlreadyAttached,

    #[error("table '{0}' is not registered")]
    TableNotRegistered(String),

    #[error("table '{table}' holds '{found}' records, not '{expected}'")]
    TableTypeMismatch {
        table: String,
        expected: &'static str,
        found: &'static str,
    },
}

///
/// Registry
///
/// Owns the configuration, the session slot and every registered table.
/// Table names are case-insensitive (stored lowercased). Schemas are
/// derived once per record type and shared between its tables.
///

#[derive(Debug, Default)]
pub struct Registry {
    config: Config,
    session: SessionSlot,
    tables: BTreeMap<String, Arc<dyn TableEntry>>,
    schemas: Mutex<HashMap<TypeId, Arc<Schema>>>,
}

impl Registry {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Attach the session every table of this registry talks through.
    /// Tables registered earlier see it too.
    pub fn attach_session(&self, session: Arc<dyn Session>) -> Result<(), RegistryError> {
        self.session
            .attach(session)
            .map_err(|_| RegistryError::SessionAlreadyAttached)
    }

    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.is_attached()
    }

    /// Register `R` under `name`. Registering the same type under the same
    /// name again returns the existing table.
    pub fn register<R: Record>(
        &mut self,
        name: &str,
        factory: impl Fn() -> R + Send + Sync + 'static,
    ) -> Result<Arc<Table<R>>, Error> {
        let name = name.to_lowercase();

        if let Some(existing) = self.tables.get(&name) {
            if let Ok(table) = Arc::clone(existing).into_any().downcast::<Table<R>>() {
                return Ok(table);
            }
            tracing::warn!(
                table = %name,
                previous = existing.record_path(),
                next = R::PATH,
                "replacing table registration"
            );
        }

        let schema = self.schema_for::<R>()?;
        let table = Arc::new(Table::from_parts(
            &name,
            schema,
            Arc::new(factory),
            &self.config,
            self.session.clone(),
        ));
        self.tables
            .insert(name.clone(), Arc::clone(&table) as Arc<dyn TableEntry>);

        tracing::info!(table = %name, record = R::PATH, "registered table");

        Ok(table)
    }

    fn schema_for<R: Record>(&self) -> Result<Arc<Schema>, Error> {
        let mut schemas = self.schemas.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(schema) = schemas.get(&TypeId::of::<R>()) {
            return Ok(Arc::clone(schema));
        }
        let schema = Arc::new(schema::derive_schema::<R>(&self.config)?);
        schemas.insert(TypeId::of::<R>(), Arc::clone(&schema));

        Ok(schema)
    }

    /// Look up a table by case-insensitive name.
    pub fn table<R: Record>(&self, name: &str) -> Result<Arc<Table<R>>, RegistryError> {
        let entry = self.entry(name)?;
        let found = entry.record_path();

        Arc::clone(entry)
            .into_any()
            .downcast::<Table<R>>()
            .map_err(|_| RegistryError::TableTypeMismatch {
                table: name.to_lowercase(),
                expected: R::PATH,
                found,
            })
    }

    pub fn entry(&self, name: &str) -> Result<&Arc<dyn TableEntry>, RegistryError> {
        let name = name.to_lowercase();

        self.tables
            .get(&name)
            .ok_or(RegistryError::TableNotRegistered(name))
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Create every registered table, in name order.
    pub fn create_all(&self) -> Result<Vec<TableDescription>, Error> {
        self.tables.values().map(|table| table.create()).collect()
    }
}

///
/// TESTS
///
