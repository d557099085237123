//! Input reads as seen by the graph builder.
//!
//! The id of a read is its position in the input collection. Characters are
//! never modified while the graph is being built.

/// A named read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSequence {
    pub name: String,
    /// ASCII bases as loaded (case preserved).
    pub characters: Vec<u8>,
}

impl ReadSequence {
    pub fn new(name: impl Into<String>, characters: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            characters: characters.into(),
        }
    }

    /// Convenience constructor for unnamed reads; the name is derived from the id.
    pub fn unnamed(id: usize, characters: impl Into<Vec<u8>>) -> Self {
        Self::new(format!("read_{id}"), characters)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}
