use {
    crate::automaton::state::StateId,
    std::fmt::{self, Display, Formatter},
};

/// One outgoing edge of a state: a closed character interval `[min, max]` targeting `to`.
///
/// A transition never owns its target; `to` is a back-reference into the owning automaton's
/// arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Transition {
    pub min: u16,
    pub max: u16,
    pub to: StateId,
}

impl Transition {
    /// Builds a transition, canonicalizing the invariant `min <= max`.
    ///
    /// # Panics
    /// Panics if `min > max`; every call site in this crate constructs intervals that already
    /// satisfy this, so a violation indicates a bug in the caller rather than bad user input.
    pub fn new(min: u16, max: u16, to: StateId) -> Self {
        assert!(min <= max, "transition interval must have min <= max, got {min}..={max}");
        Self { min, max, to }
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "-> {} [{:#06x}-{:#06x}]", self.to, self.min, self.max)
    }
}
