//! Bounded bytecode buffer
//!
//! Bytes accumulate here between flushes. The buffer never grows past its
//! capacity: an instruction that does not fit is refused whole.

use bytes::BytesMut;
use thiserror::Error;

use crate::codec::Instruction;
use crate::limits;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("bytecode buffer full: {needed} bytes needed, {available} available (capacity {capacity})")]
    Overflow {
        needed: usize,
        available: usize,
        capacity: usize,
    },
}

#[derive(Debug)]
pub struct BytecodeBuffer {
    bytes: BytesMut,
    capacity: usize,
}

impl Default for BytecodeBuffer {
    fn default() -> Self {
        Self::new(limits::MAX_BYTECODE_LEN)
    }
}

impl BytecodeBuffer {
    /// Create an empty buffer holding at most `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: BytesMut::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Free space left before the next flush is required
    pub fn remaining(&self) -> usize {
        self.capacity - self.bytes.len()
    }

    /// Check whether `len` more bytes fit
    pub fn fits(&self, len: usize) -> bool {
        len <= self.remaining()
    }

    /// Append an encoded instruction, or refuse it without touching the buffer
    pub fn push(&mut self, instruction: &Instruction) -> Result<(), BufferError> {
        let needed = instruction.encoded_len();
        if !self.fits(needed) {
            return Err(BufferError::Overflow {
                needed,
                available: self.remaining(),
                capacity: self.capacity,
            });
        }

        instruction.encode_into(&mut self.bytes);
        Ok(())
    }

    /// Pending bytes, oldest first
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }
}
