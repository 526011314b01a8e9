//! Error kinds raised by this crate: one per policy in the error-handling design, not one generic
//! catch-all.
use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

/// Raised when determinizing (or minimizing, which determinizes internally) an automaton would
/// require more work than the caller's budget allows.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TooComplexToDeterminizeError {
    /// The work limit that was exceeded.
    pub determinize_work_limit: usize,
}

impl TooComplexToDeterminizeError {
    pub fn new(determinize_work_limit: usize) -> Self {
        Self { determinize_work_limit }
    }
}

impl Display for TooComplexToDeterminizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "determinizing this automaton would require more than {} work units", self.determinize_work_limit)
    }
}

impl Error for TooComplexToDeterminizeError {}

/// A malformed regex, surfaced with the character position at which parsing failed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegexError {
    pub position: usize,
    pub message: String,
}

impl RegexError {
    pub fn new(position: usize, message: impl Into<String>) -> Self {
        Self { position, message: message.into() }
    }
}

impl Display for RegexError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "regex parse error at position {}: {}", self.position, self.message)
    }
}

impl Error for RegexError {}

/// Invalid arguments to `Xeger::new`, or an automaton that can't satisfy its own construction
/// contract (a non-accepting state with no outgoing transitions -- an invariant violation the
/// caller's live-state pruning should have already prevented).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum XegerError {
    EmptyPattern,
    Parse(RegexError),
    TooComplex(TooComplexToDeterminizeError),
    DeadEnd { state: u32 },
}

impl Display for XegerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPattern => write!(f, "xeger pattern must not be empty"),
            Self::Parse(e) => write!(f, "{e}"),
            Self::TooComplex(e) => write!(f, "{e}"),
            Self::DeadEnd { state } => {
                write!(f, "state {state} is non-accepting with no outgoing transitions; automaton is not live-pruned")
            }
        }
    }
}

impl Error for XegerError {}

impl From<RegexError> for XegerError {
    fn from(e: RegexError) -> Self {
        Self::Parse(e)
    }
}

impl From<TooComplexToDeterminizeError> for XegerError {
    fn from(e: TooComplexToDeterminizeError) -> Self {
        Self::TooComplex(e)
    }
}

/// Everything that can go wrong turning a pattern into an automaton: either the text doesn't
/// parse, or lowering it needs more determinize effort than the caller allowed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CompileError {
    Regex(RegexError),
    TooComplex(TooComplexToDeterminizeError),
}

impl Display for CompileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(e) => write!(f, "{e}"),
            Self::TooComplex(e) => write!(f, "{e}"),
        }
    }
}

impl Error for CompileError {}

impl From<RegexError> for CompileError {
    fn from(e: RegexError) -> Self {
        Self::Regex(e)
    }
}

impl From<TooComplexToDeterminizeError> for CompileError {
    fn from(e: TooComplexToDeterminizeError) -> Self {
        Self::TooComplex(e)
    }
}

/// Programmer-error faults raised by the DAFSA builder: out-of-order input, or an attempt to add
/// a string after the builder has been finished.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DafsaBuilderError {
    OutOfOrder { previous: String, next: String },
    AlreadyFinished,
}

impl Display for DafsaBuilderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfOrder { previous, next } => {
                write!(f, "DAFSA input must be sorted: {next:?} was inserted after {previous:?}")
            }
            Self::AlreadyFinished => write!(f, "cannot add a word to a DAFSA builder that has already been finished"),
        }
    }
}

impl Error for DafsaBuilderError {}
