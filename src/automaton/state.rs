use std::fmt::{self, Debug, Display, Formatter};

/// Index of a state inside the arena owned by an [Automaton](super::core::Automaton).
///
/// The index doubles as the "number" slot the distilled design calls out separately for
/// array-indexed traversals: since the arena is a dense `Vec`, a state's identity and its
/// position for frontier/bitset indexing are the same value.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StateId(pub(crate) u32);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Debug for StateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "State({})", self.0)
    }
}

impl Display for StateId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "State({})", self.0)
    }
}
