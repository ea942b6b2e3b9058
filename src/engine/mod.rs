//! The storage engine seam between the networking layer and the store.
//!
//! [`Store`] is the one engine this crate ships; the trait keeps the server
//! generic over the engine so tests can substitute instrumented engines and
//! alternative backends stay possible.
//!
//! [`Store`]: crate::Store

use crate::buffer::Buffer;
use crate::Result;

/// The atomic key-value operations a storage engine must provide.
///
/// An engine handle is cheap to clone; each connection worker holds its own
/// clone, and all clones observe one shared, consistent state. Key-not-found
/// is reported through the return values, never as an error.
pub trait KvEngine: Clone + Send + 'static {
    /// Stores `value` under `key`, overwriting any existing value.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Returns the value stored under `key`, or `None` if the key is absent.
    fn get(&self, key: &[u8]) -> Result<Option<Buffer>>;

    /// Removes `key` and its value. Returns whether the key existed.
    fn del(&self, key: &[u8]) -> Result<bool>;

    /// Returns whether `key` currently holds a value.
    fn exists(&self, key: &[u8]) -> Result<bool>;

    /// Moves the value stored under `old_key` to `new_key`, replacing any
    /// value already there. Returns `false` if `old_key` is absent.
    fn rename(&self, old_key: &[u8], new_key: &[u8]) -> Result<bool>;
}

mod store;

pub use self::store::Store;
