use crate::{
    access::AccessError, config::ConfigError, registry::RegistryError, session::SessionError,
    tags::MetadataError, wire::EncodingError,
};
use thiserror::Error as ThisError;

///
/// Error
///
/// Top-level error for operations that cross more than one concern
/// (registration, table provisioning, save). Component operations return
/// their own error type; every variant here converts from one of them.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("table '{0}' has no session attached")]
    NoSession(String),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl Error {
    /// Whether this error reports a missing field on a record type.
    #[must_use]
    pub const fn is_field_not_found(&self) -> bool {
        matches!(self, Self::Access(AccessError::FieldNotFound(_)))
    }
}
