use crate::buffer::Buffer;

/// default number of buckets in a [`HashIndex`]
pub const DEFAULT_BUCKET_COUNT: usize = 1024;

/// One live key/value pair held by the index.
#[derive(Debug)]
pub struct Entry {
    key: Buffer,
    value: Buffer,
}

/// A fixed-bucket-count hash table mapping binary keys to binary values.
///
/// The bucket count is fixed at construction and the table never resizes;
/// long chains are an accepted degradation under high key cardinality.
/// Each bucket owns its entries outright in a `Vec`, so there are no
/// individually heap-owned chain nodes to leak or double free.
///
/// Keys are matched by the exact `(length, bytes)` pair. Within a bucket the
/// newest insert takes scan priority, matching a chain that prepends on
/// insert. The index itself is not synchronized; [`Store`] wraps it in the
/// process-wide lock.
///
/// [`Store`]: crate::Store
#[derive(Debug)]
pub struct HashIndex {
    buckets: Vec<Vec<Entry>>,
    entries: usize,
}

/// Polynomial rolling hash over raw bytes: `h = h * 37 + byte`.
///
/// Operates on the full byte slice (not C-string semantics) so keys
/// containing spaces, zero bytes, or other non-printable bytes hash
/// consistently with how they are compared.
fn hash(key: &[u8]) -> u64 {
    let mut h: u64 = 0;
    for &byte in key {
        h = h.wrapping_mul(37).wrapping_add(u64::from(byte));
    }
    h
}

impl HashIndex {
    /// creates an index with [`DEFAULT_BUCKET_COUNT`] buckets
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKET_COUNT)
    }

    /// creates an index with the given number of buckets
    ///
    /// # Panics
    /// panics if `bucket_count` is zero
    pub fn with_buckets(bucket_count: usize) -> Self {
        assert!(bucket_count > 0, "bucket count must be non-zero");
        let mut buckets = Vec::with_capacity(bucket_count);
        buckets.resize_with(bucket_count, Vec::new);
        HashIndex {
            buckets,
            entries: 0,
        }
    }

    /// the bucket a key hashes to
    fn bucket_of(&self, key: &[u8]) -> usize {
        (hash(key) % self.buckets.len() as u64) as usize
    }

    /// Inserts `key`/`value`, overwriting the value of an existing entry
    /// with a matching key. Both slices are copied into owned buffers; the
    /// previous value buffer, if any, is released.
    pub fn put(&mut self, key: &[u8], value: &[u8]) {
        let bucket = self.bucket_of(key);
        if let Some(entry) = self.buckets[bucket]
            .iter_mut()
            .rev()
            .find(|e| e.key == key)
        {
            entry.value = Buffer::copy_from(value);
            return;
        }
        self.buckets[bucket].push(Entry {
            key: Buffer::copy_from(key),
            value: Buffer::copy_from(value),
        });
        self.entries += 1;
    }

    /// returns a read-only view of the value stored under `key`, if present
    pub fn get(&self, key: &[u8]) -> Option<&Buffer> {
        let bucket = self.bucket_of(key);
        self.buckets[bucket]
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| &e.value)
    }

    /// Unlinks the entry stored under `key`, releasing its buffers.
    /// Returns whether a removal occurred.
    pub fn remove(&mut self, key: &[u8]) -> bool {
        let bucket = self.bucket_of(key);
        match self.buckets[bucket].iter().rposition(|e| e.key == key) {
            Some(pos) => {
                self.buckets[bucket].remove(pos);
                self.entries -= 1;
                true
            }
            None => false,
        }
    }

    /// returns whether an entry exists under `key`, without mutating anything
    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Moves the entry stored under `old_key` to `new_key`, transferring
    /// ownership of the value buffer without copying its bytes. Any entry
    /// already stored under `new_key` is released first.
    ///
    /// Returns `false` (and changes nothing) if `old_key` is absent.
    pub fn rename(&mut self, old_key: &[u8], new_key: &[u8]) -> bool {
        if old_key == new_key {
            return self.contains(old_key);
        }

        let old_bucket = self.bucket_of(old_key);
        let entry = match self.buckets[old_bucket].iter().rposition(|e| e.key == old_key) {
            Some(pos) => self.buckets[old_bucket].remove(pos),
            None => return false,
        };
        self.entries -= 1;

        // value buffer moves out of the old entry; only its key is dropped
        let value = entry.value;
        // release any prior entry under the target key
        self.remove(new_key);

        let new_bucket = self.bucket_of(new_key);
        self.buckets[new_bucket].push(Entry {
            key: Buffer::copy_from(new_key),
            value,
        });
        self.entries += 1;
        true
    }

    /// the number of live entries in the index
    pub fn len(&self) -> usize {
        self.entries
    }

    /// returns `true` if the index holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries == 0
    }
}

impl Default for HashIndex {
    fn default() -> Self {
        Self::new()
    }
}
