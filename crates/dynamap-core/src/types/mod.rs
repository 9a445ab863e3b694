//! Leaf value types that have no direct std counterpart on the wire.

mod blob;
mod timestamp;

pub use blob::Blob;
pub use timestamp::Timestamp;
