use crate::error::{Error, Result};

/// A position within backing bytes which never moves past their end. Every operation checks the bounds before it
/// touches memory and fails with [`Error::OutOfRange`] otherwise, leaving the position unchanged.
#[derive(Debug, Clone, Default)]
pub struct Cursor<B> {
    bytes: B,
    position: usize,
}

impl<B: AsRef<[u8]>> Cursor<B> {

    pub fn new(bytes: B) -> Self {
        Self { bytes, position: 0 }
    }

    /// Returns the current offset within the backing bytes.
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.as_ref().len()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.capacity() - self.position
    }

    #[inline]
    pub fn check(&self, len: usize) -> Result<()> {
        if len > self.remaining() {
            Err(Error::OutOfRange { position: self.position, requested: len, capacity: self.capacity() })
        } else {
            Ok(())
        }
    }

    /// Returns the next `len` bytes without advancing.
    #[inline]
    pub fn peek(&self, len: usize) -> Result<&[u8]> {
        self.check(len)?;
        Ok(&self.bytes.as_ref()[self.position..self.position + len])
    }

    /// Returns the byte at the absolute `index` without advancing.
    #[inline]
    pub fn byte_at(&self, index: usize) -> Result<u8> {
        self.bytes.as_ref().get(index).copied().ok_or(Error::OutOfRange {
            position: index,
            requested: 1,
            capacity: self.capacity(),
        })
    }

    /// Returns everything between the position and the end.
    #[inline]
    pub fn rest(&self) -> &[u8] {
        &self.bytes.as_ref()[self.position..]
    }

    #[inline]
    pub fn advance(&mut self, len: usize) -> Result<()> {
        self.check(len)?;
        self.position += len;
        Ok(())
    }

    /// Moves back to an earlier `position`. Positions ahead of the current one are ignored.
    #[inline]
    pub fn rewind(&mut self, position: usize) {
        self.position = self.position.min(position);
    }

    /// Returns the backing bytes and the final position.
    pub fn into_inner(self) -> (B, usize) {
        (self.bytes, self.position)
    }

}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Cursor<B> {

    /// Returns the next `len` bytes for writing and advances past them.
    #[inline]
    pub fn take_mut(&mut self, len: usize) -> Result<&mut [u8]> {
        self.check(len)?;
        let start = self.position;
        self.position += len;
        Ok(&mut self.bytes.as_mut()[start..start + len])
    }

}

impl<'a> Cursor<&'a [u8]> {

    /// Returns the next `len` bytes, borrowed for as long as the backing slice lives, and advances past them.
    #[inline]
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        self.check(len)?;
        let bytes: &'a [u8] = self.bytes;
        let start = self.position;
        self.position += len;
        Ok(&bytes[start..start + len])
    }

    /// Like [`rest`](Self::rest), borrowed for as long as the backing slice lives.
    #[inline]
    pub fn tail(&self) -> &'a [u8] {
        &self.bytes[self.position..]
    }

}
