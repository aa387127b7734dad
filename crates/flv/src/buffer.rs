//! Growable storage for one serialized FLV tag.
//!
//! A [`TagBuffer`] holds `header (11) + data (size) + PreviousTagSize (4)` bytes.
//! The allocated region only ever grows; the used length is set by the
//! reader or by [`TagBuffer::update_size`](crate::TagBuffer::update_size).

use bytes::{Bytes, BytesMut};

#[derive(Debug, Clone, Default)]
pub struct TagBuffer {
    /// Allocated region. `data.len()` is the capacity, every byte is initialised.
    pub(crate) data: BytesMut,
    /// Number of bytes in use.
    pub(crate) len: usize,
}

impl TagBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut buffer = Self::new();
        buffer.reserve(capacity);
        buffer
    }

    /// Wraps a complete serialized tag (header, data and trailing size).
    pub fn from_slice(bytes: &[u8]) -> Self {
        TagBuffer {
            data: BytesMut::from(bytes),
            len: bytes.len(),
        }
    }

    /// Ensures `capacity() >= size`.
    ///
    /// Grows the allocation to exactly `size` bytes when needed, keeping the
    /// existing content. Never shrinks.
    pub fn reserve(&mut self, size: usize) {
        if size > self.data.len() {
            self.data.resize(size, 0);
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Forgets the content but keeps the allocation.
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// The bytes in use.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn into_bytes(self) -> Bytes {
        let mut data = self.data;
        data.truncate(self.len);
        data.freeze()
    }

    pub fn swap(&mut self, other: &mut TagBuffer) {
        std::mem::swap(self, other);
    }

    /// Takes ownership of `new` and hands back the previous storage.
    pub fn replace(&mut self, new: TagBuffer) -> TagBuffer {
        std::mem::replace(self, new)
    }
}

impl AsRef<[u8]> for TagBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
