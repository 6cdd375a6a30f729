//! buffer.rs
//! Output buffer with capacity decoupled from used length.
//!
//! Codecs need a destination slice of known size. The session grows the
//! buffer speculatively (e.g. worst case = input + 1), hands the spare window
//! to the codec, then records how much the codec actually produced.

use bytes::Bytes;

use crate::types::EngineError;

#[derive(Debug, Default)]
pub struct GrowableBuffer {
    // Initialized up to `storage.len()`, which is the capacity seen by codecs.
    storage: Vec<u8>,
    len: usize,
}

impl GrowableBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with `capacity` writable bytes.
    ///
    /// # Errors
    /// - `EngineError::Allocation` if the allocation fails.
    pub fn with_capacity(capacity: usize) -> Result<Self, EngineError> {
        let mut buf = Self::new();
        buf.grow_by(capacity)?;
        Ok(buf)
    }

    /// Total writable bytes (used + spare).
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes still available past the used length.
    pub fn spare_len(&self) -> usize {
        self.capacity() - self.len
    }

    /// Ensure at least `additional` bytes of capacity beyond the current capacity.
    ///
    /// Growth is geometric (at least doubling) so repeated small grows stay
    /// amortized O(1). Existing bytes keep their offsets; capacity never shrinks.
    ///
    /// # Errors
    /// - `EngineError::Allocation` on overflow or allocator failure.
    pub fn grow_by(&mut self, additional: usize) -> Result<(), EngineError> {
        if additional == 0 {
            return Ok(());
        }
        let current = self.capacity();
        let target = current
            .checked_add(additional)
            .ok_or(EngineError::Allocation { requested: additional })?;
        let new_capacity = target.max(current.saturating_mul(2));

        self.storage
            .try_reserve_exact(new_capacity - current)
            .map_err(|_| EngineError::Allocation { requested: additional })?;
        self.storage.resize(new_capacity, 0);
        Ok(())
    }

    /// Record `n` bytes written into the spare window.
    ///
    /// # Panics
    /// If `len + n` exceeds the capacity. That is a codec adapter bug, never
    /// a recoverable condition.
    pub fn increase_length_by(&mut self, n: usize) {
        assert!(
            self.len + n <= self.capacity(),
            "increase_length_by({}) past capacity: len={} capacity={}",
            n,
            self.len,
            self.capacity()
        );
        self.len += n;
    }

    /// Forget written bytes, keep the allocation.
    pub fn reset_length(&mut self) {
        self.len = 0;
    }

    /// Writable window `[len, capacity)`.
    pub fn spare_capacity_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.len..]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    /// Freeze the used bytes.
    pub fn into_bytes(mut self) -> Bytes {
        self.storage.truncate(self.len);
        Bytes::from(self.storage)
    }
}

impl AsRef<[u8]> for GrowableBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
