use std::fmt;
use std::ops::Deref;

use bytes::Bytes;

/// An owned byte sequence with an explicit length, used uniformly for keys
/// and values in the store.
///
/// A `Buffer` is never treated as text: it may contain zero bytes, spaces,
/// or any other non-printable data. Equality is exact and length-qualified,
/// so two buffers of different length are never equal even if one is a
/// byte prefix of the other.
///
/// Internally a `Buffer` wraps [`Bytes`], so cloning one (e.g. to hand a
/// value back from a `GET`) is a reference count bump, and moving one
/// (e.g. during a `RENAME`) never copies the payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Buffer(Bytes);

impl Buffer {
    /// creates a `Buffer` by copying the given bytes
    pub fn copy_from(bytes: &[u8]) -> Self {
        Buffer(Bytes::copy_from_slice(bytes))
    }

    /// the number of bytes in this buffer
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// returns `true` if this buffer holds zero bytes
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// a read-only view of the bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// consumes this buffer, returning an owned `Vec<u8>` copy of the bytes
    pub fn into_vec(self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl Deref for Buffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(v: Vec<u8>) -> Self {
        Buffer(Bytes::from(v))
    }
}

impl From<&[u8]> for Buffer {
    fn from(b: &[u8]) -> Self {
        Buffer::copy_from(b)
    }
}

impl From<&str> for Buffer {
    fn from(s: &str) -> Self {
        Buffer::copy_from(s.as_bytes())
    }
}

impl PartialEq<[u8]> for Buffer {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<&[u8]> for Buffer {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_bytes() == *other
    }
}

/// Debug-prints the bytes with escaping so binary payloads stay loggable
impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b\"")?;
        for &byte in self.0.iter() {
            for esc in std::ascii::escape_default(byte) {
                write!(f, "{}", esc as char)?;
            }
        }
        write!(f, "\"")
    }
}
