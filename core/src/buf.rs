//! Reusable byte buffer backing partial-token capture.
//!
//! Both lexers stash the bytes of a token that straddles a chunk boundary
//! here, so that when the token finally completes its payload is one
//! contiguous slice. The buffer keeps its allocation across `clear` calls;
//! a long parse settles into a steady state with no per-token allocation.

/// Append-mostly growable byte container.
///
/// The forward lexer only ever appends. The reverse lexer consumes its
/// chunks right-to-left, so each later chunk contributes *earlier* source
/// bytes and lands at the front via [`Buf::prepend`].
#[derive(Debug, Clone, Default)]
pub(crate) struct Buf {
    data: Vec<u8>,
}

impl Buf {
    #[inline]
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Append bytes at the end.
    #[inline]
    pub fn append(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Insert bytes at the front, shifting existing content right.
    pub fn prepend(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let old = self.data.len();
        self.data.resize(old + bytes.len(), 0);
        self.data.copy_within(..old, bytes.len());
        self.data[..bytes.len()].copy_from_slice(bytes);
    }

    /// Drop content but keep the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Shorten to `len` bytes. Used by `peek` to undo speculative appends.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        self.data.truncate(len);
    }
}
