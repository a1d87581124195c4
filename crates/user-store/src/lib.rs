//! User and group storage for the gadget bot.
//!
//! Users are created lazily on first contact; groups are named permission
//! buckets with many-to-many membership.

mod error;
mod file;
mod store;
mod types;

pub use error::StoreError;
pub use file::FileStore;
pub use store::{MemoryStore, UserStore};
pub use types::*;
