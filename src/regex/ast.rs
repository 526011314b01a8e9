//! The regex parse tree: a fixed tagged variant, lowered to automata by a single dispatching
//! function in [super::lower].
use bitflags::bitflags;

bitflags! {
    /// Which optional regex syntax extensions a [super::Parser] accepts.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct SyntaxFlags: u32 {
        /// `&` binary intersection.
        const INTERSECTION = 0b0000_0001;
        /// `~` unary complement.
        const COMPLEMENT   = 0b0000_0010;
        /// `#` empty language.
        const EMPTY        = 0b0000_0100;
        /// `@` any string.
        const ANYSTRING    = 0b0000_1000;
        /// `<name>` named-automaton reference.
        const AUTOMATON    = 0b0001_0000;
        /// `<min-max>` integer interval.
        const INTERVAL     = 0b0010_0000;
    }
}

impl SyntaxFlags {
    /// All syntax extensions except `@` (any-string) -- what Xeger parses with.
    pub fn generator_default() -> Self {
        Self::all() & !Self::ANYSTRING
    }
}

impl Default for SyntaxFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// One node of the parse tree.
#[derive(Clone, Debug)]
pub enum Node {
    Union(Vec<Node>),
    Concatenation(Vec<Node>),
    Intersection(Box<Node>, Box<Node>),
    Optional(Box<Node>),
    Repeat(Box<Node>),
    RepeatMin(Box<Node>, u32),
    RepeatMinMax(Box<Node>, u32, u32),
    Complement(Box<Node>),
    Char(u16),
    CharRange(u16, u16),
    AnyChar,
    Empty,
    String(Vec<u16>),
    AnyString,
    /// A `<name>` reference; the `usize` is the position of the reference, for error reporting
    /// if the name fails to resolve during lowering.
    AutomatonRef(String, usize),
    /// `(min, max, digits, pos)`; `digits == 0` means no fixed width. `pos` is the position of
    /// the `<` that opened the interval, for error reporting if lowering it fails.
    Interval(u32, u32, usize, usize),
}

/// Desugars a set of (possibly overlapping) char ranges into a [Node] using only the tags above --
/// char classes and the `\d`/`\w`/... shorthands have no dedicated AST tag of their own.
pub(crate) fn ranges_to_node(mut ranges: Vec<(u16, u16)>) -> Node {
    ranges.sort_unstable();
    match ranges.len() {
        0 => Node::Empty,
        1 => {
            let (lo, hi) = ranges[0];
            if lo == hi {
                Node::Char(lo)
            } else {
                Node::CharRange(lo, hi)
            }
        }
        _ => Node::Union(
            ranges
                .into_iter()
                .map(|(lo, hi)| if lo == hi { Node::Char(lo) } else { Node::CharRange(lo, hi) })
                .collect(),
        ),
    }
}

/// Complements `ranges` against the printable-ASCII universe `[0x20, 0x7E]` -- per this crate's
/// deliberate choice to define negation against printable ASCII rather than the full BMP.
pub(crate) fn complement_ranges(ranges: &[(u16, u16)]) -> Vec<(u16, u16)> {
    let mut sorted = ranges.to_vec();
    sorted.sort_unstable();
    let mut comp = Vec::new();
    let mut next = 0x20u16;
    for (lo, hi) in sorted {
        let lo = lo.max(0x20);
        let hi = hi.min(0x7E);
        if lo > hi {
            continue;
        }
        if lo > next {
            comp.push((next, lo - 1));
        }
        next = next.max(hi.saturating_add(1));
    }
    if next <= 0x7E {
        comp.push((next, 0x7E));
    }
    comp
}
