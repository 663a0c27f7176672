//! The token ring between the low-level decoder and the event driver.

use alloc::vec::Vec;

use crate::token::Token;

/// A fixed-capacity ring of tokens.
///
/// The decoder pushes at the back; the driver pops at the front. When the
/// decoder suspends for want of space, [`compact`](Self::compact) slides the
/// unread tail to index 0. Compaction moves tokens only, never source bytes.
#[derive(Debug)]
pub struct TokenBuffer {
    data: Vec<Token>,
    ri: usize,
    capacity: usize,
}

impl TokenBuffer {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            ri: 0,
            capacity,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ri >= self.data.len()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    /// Unread tokens remaining.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len() - self.ri
    }

    /// Appends a token. Returns false when the ring is full (the decoder
    /// should suspend with a short write).
    pub fn push(&mut self, token: Token) -> bool {
        if self.is_full() {
            return false;
        }
        self.data.push(token);
        true
    }

    pub fn pop(&mut self) -> Option<Token> {
        let token = self.data.get(self.ri).copied()?;
        self.ri += 1;
        Some(token)
    }

    /// Steps the read index back over the most recently popped token.
    ///
    /// Only valid immediately after a [`pop`](Self::pop), before any
    /// compaction.
    pub fn unread(&mut self) {
        debug_assert!(self.ri > 0);
        self.ri = self.ri.saturating_sub(1);
    }

    /// Discards consumed tokens, making room at the back.
    pub fn compact(&mut self) {
        self.data.drain(..self.ri);
        self.ri = 0;
    }
}
