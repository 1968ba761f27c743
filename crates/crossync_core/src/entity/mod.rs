//! Entity identity and the versioned record snapshot.

mod id;
mod record;
mod version;

pub use id::EntityId;
pub use record::Record;
pub use version::{Timestamp, VersionToken};
