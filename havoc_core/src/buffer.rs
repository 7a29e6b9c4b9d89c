use thiserror::Error;

/// Length above which the growth operator stops growing a variable-length buffer.
pub const MAX_LEN: usize = 1024 * 1024;

/// Errors raised while mutating a buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    /// The growth operator could not reserve its new backing store.
    /// The buffer being mutated is left as it was before that step.
    #[error("Failed to allocate {requested} bytes while growing buffer")]
    AllocationFailed { requested: usize },
}

/// An owned byte buffer with a logical length that can trail its backing store.
///
/// Deletion only moves the logical end; growth swaps in a freshly allocated
/// store holding the new content plus a zero sentinel. Bytes of the store past
/// `len` are never part of the buffer's value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationBuffer {
    store: Vec<u8>,
    len: usize,
}

impl MutationBuffer {
    /// Takes ownership of `bytes` as-is.
    pub fn new(bytes: Vec<u8>) -> Self {
        let len = bytes.len();
        Self { store: bytes, len }
    }

    /// Copies `bytes` into a store one byte longer, terminated by a zero sentinel.
    pub fn with_sentinel(bytes: &[u8]) -> Self {
        let mut store = Vec::with_capacity(bytes.len() + 1);
        store.extend_from_slice(bytes);
        store.push(0);
        Self {
            store,
            len: bytes.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the backing store, including any sentinel or stale tail.
    pub fn store_len(&self) -> usize {
        self.store.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.store[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.store[..self.len]
    }

    /// Consumes the buffer, returning exactly its `len` bytes.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.store.truncate(self.len);
        self.store
    }

    /// Moves the logical end down to `new_len`; the store is kept.
    pub(crate) fn truncate(&mut self, new_len: usize) {
        debug_assert!(new_len <= self.len);
        self.len = new_len.min(self.len);
    }

    /// Installs a new backing store, releasing the previous one.
    pub(crate) fn replace_store(&mut self, store: Vec<u8>, len: usize) {
        debug_assert!(len <= store.len());
        self.store = store;
        self.len = len;
    }
}

/// Reserves an empty store able to hold `size` bytes without reallocating.
pub(crate) fn try_alloc_store(size: usize) -> Result<Vec<u8>, MutationError> {
    let mut store = Vec::new();
    store
        .try_reserve_exact(size)
        .map_err(|_| MutationError::AllocationFailed { requested: size })?;
    Ok(store)
}

impl From<Vec<u8>> for MutationBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<MutationBuffer> for Vec<u8> {
    fn from(buffer: MutationBuffer) -> Self {
        buffer.into_vec()
    }
}

impl AsRef<[u8]> for MutationBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
