use crate::{
    Error,
    access::{Binding, RecordHandle},
    config::Config,
    schema::{self, Schema, Throughput},
    session::{CreateTableRequest, Session, SessionSlot, TableDescription},
    tags::MetadataError,
    traits::Record,
    wire::Encoder,
};
use std::{any::Any, fmt, sync::Arc};

type Factory<R> = Arc<dyn Fn() -> R + Send + Sync>;

///
/// Table
///
/// A named table for record type `R`: the schema derived at construction,
/// a factory for fresh records, and the session used to provision the
/// table and persist records.
///

pub struct Table<R> {
    name: Arc<str>,
    schema: Arc<Schema>,
    factory: Factory<R>,
    throughput: Throughput,
    encoder: Encoder,
    session: SessionSlot,
}

impl<R: Record> Table<R> {
    /// Derive `R`'s schema and build an unattached table.
    pub fn new(
        name: &str,
        factory: impl Fn() -> R + Send + Sync + 'static,
        config: &Config,
    ) -> Result<Self, MetadataError> {
        let schema = Arc::new(schema::derive_schema::<R>(config)?);

        Ok(Self::from_parts(
            name,
            schema,
            Arc::new(factory),
            config,
            SessionSlot::default(),
        ))
    }

    pub(crate) fn from_parts(
        name: &str,
        schema: Arc<Schema>,
        factory: Factory<R>,
        config: &Config,
        session: SessionSlot,
    ) -> Self {
        Self {
            name: Arc::from(name),
            schema,
            factory,
            throughput: config.throughput,
            encoder: Encoder::from_config(config),
            session,
        }
    }

    /// Replace the session slot with one holding `session`.
    #[must_use]
    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = SessionSlot::with(session);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub const fn throughput(&self) -> Throughput {
        self.throughput
    }

    #[must_use]
    pub fn has_session(&self) -> bool {
        self.session.is_attached()
    }

    /// A fresh record from the factory, bound to this table.
    #[must_use]
    pub fn new_record(&self) -> RecordHandle<R> {
        self.bind((self.factory)())
    }

    /// Bind an existing record to this table.
    #[must_use]
    pub fn bind(&self, record: R) -> RecordHandle<R> {
        RecordHandle::new(
            record,
            Binding {
                table_name: Arc::clone(&self.name),
                schema: Arc::clone(&self.schema),
                encoder: self.encoder,
                session: self.session.clone(),
            },
        )
    }

    #[must_use]
    pub fn create_request(&self) -> CreateTableRequest {
        CreateTableRequest::from_schema(&self.name, &self.schema, self.throughput)
    }

    pub fn create(&self) -> Result<TableDescription, Error> {
        let description = self.session()?.create_table(self.create_request())?;
        tracing::info!(table = %self.name, "created table");

        Ok(description)
    }

    pub fn delete(&self) -> Result<TableDescription, Error> {
        let description = self.session()?.delete_table(&self.name)?;
        tracing::info!(table = %self.name, "deleted table");

        Ok(description)
    }

    fn session(&self) -> Result<&Arc<dyn Session>, Error> {
        self.session
            .get()
            .ok_or_else(|| Error::NoSession(self.name.to_string()))
    }
}

impl<R> fmt::Debug for Table<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name)
            .field("schema", &self.schema)
            .field("throughput", &self.throughput)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

///
/// TableEntry
/// Type-erased view of a `Table<R>`, as stored by the registry.
///

pub trait TableEntry: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn record_path(&self) -> &'static str;

    fn schema(&self) -> &Schema;

    fn create(&self) -> Result<TableDescription, Error>;

    fn delete(&self) -> Result<TableDescription, Error>;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<R: Record> TableEntry for Table<R> {
    fn name(&self) -> &str {
        Self::name(self)
    }

    fn record_path(&self) -> &'static str {
        R::PATH
    }

    fn schema(&self) -> &Schema {
        Self::schema(self)
    }

    fn create(&self) -> Result<TableDescription, Error> {
        Self::create(self)
    }

    fn delete(&self) -> Result<TableDescription, Error> {
        Self::delete(self)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::BaseFields,
        schema::KeyRole,
        session::{MemorySession, SessionError, TableStatus},
        wire::{AttributeValue, WireType},
    };
    use dynamap_derive::Record;

    #[derive(Clone, Debug, Default, Record)]
    struct Event {
        #[dynamap(base)]
        base: BaseFields,

        #[dynamap(attr = "kind", key = "partition")]
        kind: String,

        #[dynamap(attr = "at", key = "sort")]
        at: i64,

        #[dynamap(attr = "payload")]
        payload: String,
    }

    fn table() -> Table<Event> {
        Table::new("events", Event::default, &Config::default()).unwrap()
    }

    #[test]
    fn create_request_carries_key_definitions_only() {
        let request = table().create_request();

        let names: Vec<_> = request
            .attribute_definitions
            .iter()
            .map(|a| (a.name.as_str(), a.wire_type))
            .collect();
        assert_eq!(names, [("at", WireType::Number), ("kind", WireType::String)]);
        assert_eq!(request.key_schema[0].role, KeyRole::Partition);
        assert_eq!(request.throughput, Throughput::default());
    }

    #[test]
    fn unattached_table_reports_no_session() {
        let table = table();

        assert!(!table.has_session());
        assert!(matches!(table.create(), Err(Error::NoSession(name)) if name == "events"));

        let mut record = table.new_record();
        assert!(matches!(record.save(), Err(Error::NoSession(_))));
    }

    #[test]
    fn save_stamps_and_stores() {
        let session = Arc::new(MemorySession::new());
        let table = table().with_session(session.clone());
        table.create().unwrap();

        let mut record = table.new_record();
        record.kind = "login".into();
        record.at = 42;
        record.save().unwrap();

        assert!(!record.base.id.is_empty());
        assert!(!record.base.created_at.is_zero());
        assert_eq!(record.base.created_at, record.base.updated_at);

        let items = session.items("events").unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["kind"], AttributeValue::S("login".into()));
        assert_eq!(items[0]["id"], AttributeValue::S(record.base.id.clone()));

        let created = record.base.created_at;
        record.payload = "again".into();
        record.save().unwrap();
        assert_eq!(record.base.created_at, created);
        assert_eq!(session.items("events").unwrap().len(), 1);
    }

    #[test]
    fn delete_then_recreate() {
        let session = Arc::new(MemorySession::new());
        let table = table().with_session(session);

        table.create().unwrap();
        assert!(matches!(
            table.create(),
            Err(Error::Session(SessionError::TableExists(_)))
        ));

        let description = table.delete().unwrap();
        assert_eq!(description.status, TableStatus::Deleting);
        table.create().unwrap();
    }

    #[test]
    fn handle_exposes_binding() {
        let table = table();
        let handle = table.bind(Event {
            kind: "k".into(),
            ..Event::default()
        });

        assert_eq!(handle.table_name(), "events");
        assert_eq!(handle.schema(), table.schema());
        assert_eq!(handle.into_inner().kind, "k");
    }
}
