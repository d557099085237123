//! Vertices: the two extremities of every read.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum VertexEnd {
    Start = 0,
    End = 1,
}

impl VertexEnd {
    #[inline]
    pub fn opposite(self) -> Self {
        match self {
            VertexEnd::Start => VertexEnd::End,
            VertexEnd::End => VertexEnd::Start,
        }
    }
}

/// One end of one read. Ordered by `(sequence_id, end)`, which matches the
/// order of `index()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssemblyVertex {
    pub sequence_id: usize,
    pub end: VertexEnd,
}

impl AssemblyVertex {
    #[inline]
    pub fn new(sequence_id: usize, end: VertexEnd) -> Self {
        Self { sequence_id, end }
    }

    #[inline]
    pub fn start(sequence_id: usize) -> Self {
        Self::new(sequence_id, VertexEnd::Start)
    }

    #[inline]
    pub fn end(sequence_id: usize) -> Self {
        Self::new(sequence_id, VertexEnd::End)
    }

    #[inline]
    pub fn is_start(&self) -> bool {
        self.end == VertexEnd::Start
    }

    /// Dense index: `2 * sequence_id` for the start, `+ 1` for the end.
    #[inline]
    pub fn index(&self) -> usize {
        2 * self.sequence_id + self.end as usize
    }

    #[inline]
    pub fn from_index(index: usize) -> Self {
        let end = if index % 2 == 0 {
            VertexEnd::Start
        } else {
            VertexEnd::End
        };
        Self::new(index / 2, end)
    }

    /// The other extremity of the same read.
    #[inline]
    pub fn mate(&self) -> Self {
        Self::new(self.sequence_id, self.end.opposite())
    }
}

impl fmt::Display for AssemblyVertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = if self.is_start() { 'B' } else { 'E' };
        write!(f, "{}{}", self.sequence_id, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for idx in 0..10 {
            assert_eq!(AssemblyVertex::from_index(idx).index(), idx);
        }
        assert_eq!(AssemblyVertex::start(3).index(), 6);
        assert_eq!(AssemblyVertex::end(3).index(), 7);
    }

    #[test]
    fn test_mate_and_display() {
        let v = AssemblyVertex::start(12);
        assert_eq!(v.mate(), AssemblyVertex::end(12));
        assert_eq!(v.mate().mate(), v);
        assert_eq!(v.to_string(), "12B");
        assert_eq!(v.mate().to_string(), "12E");
        assert!(v.is_start());
        assert!(!v.mate().is_start());
    }

    #[test]
    fn test_ordering_follows_index() {
        let mut vs = vec![
            AssemblyVertex::end(1),
            AssemblyVertex::start(2),
            AssemblyVertex::start(1),
            AssemblyVertex::end(0),
        ];
        vs.sort();
        let idx: Vec<usize> = vs.iter().map(|v| v.index()).collect();
        assert_eq!(idx, vec![1, 2, 3, 4]);
    }
}
