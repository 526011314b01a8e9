//! The regex surface: parse a pattern into a [ast::Node] tree, then lower it to an [Automaton]
//! one tag at a time, minimizing every intermediate result.
pub mod ast;
pub mod parser;

pub use ast::{Node, SyntaxFlags};
pub use parser::Parser;

use {
    crate::{
        automaton::{basic, core::Automaton, operations},
        error::{CompileError, RegexError},
    },
    log::error,
    std::collections::HashMap,
};

/// A mapping of name to pre-built automaton, consulted first when resolving a `<name>` reference.
pub type NamedAutomata = HashMap<String, Automaton>;

/// A fallback collaborator consulted when a `<name>` reference isn't found in the [NamedAutomata]
/// map passed to [compile].
pub trait AutomatonProvider {
    fn get_automaton(&self, name: &str) -> Option<Automaton>;
}

/// Parses and lowers `pattern` into an automaton.
///
/// `named` is checked first for any `<name>` reference, then `provider`; an unresolved name is a
/// parse error carrying the reference's position. Every intermediate automaton built during
/// lowering is minimized, spending at most `work_limit` determinize effort each time.
pub fn compile(
    pattern: &str,
    flags: SyntaxFlags,
    named: &NamedAutomata,
    provider: Option<&dyn AutomatonProvider>,
    work_limit: usize,
) -> Result<Automaton, CompileError> {
    let ast = Parser::new(pattern, flags).parse()?;
    lower(&ast, named, provider, work_limit)
}

fn lower(
    node: &Node,
    named: &NamedAutomata,
    provider: Option<&dyn AutomatonProvider>,
    work_limit: usize,
) -> Result<Automaton, CompileError> {
    let built = match node {
        Node::Union(list) => {
            let children = lower_all(list, named, provider, work_limit)?;
            let refs: Vec<&Automaton> = children.iter().collect();
            operations::union(&refs)
        }
        Node::Concatenation(list) => {
            let children = lower_all(list, named, provider, work_limit)?;
            let refs: Vec<&Automaton> = children.iter().collect();
            operations::concatenate(&refs)
        }
        Node::Intersection(a, b) => {
            let la = lower(a, named, provider, work_limit)?;
            let lb = lower(b, named, provider, work_limit)?;
            operations::intersection(&la, &lb)
        }
        Node::Optional(inner) => operations::optional(&lower(inner, named, provider, work_limit)?),
        Node::Repeat(inner) => operations::repeat(&lower(inner, named, provider, work_limit)?),
        Node::RepeatMin(inner, n) => operations::repeat_n(&lower(inner, named, provider, work_limit)?, *n as usize),
        Node::RepeatMinMax(inner, n, m) => {
            operations::repeat_range(&lower(inner, named, provider, work_limit)?, *n as usize, *m as usize)
        }
        Node::Complement(inner) => {
            let resolved = lower(inner, named, provider, work_limit)?;
            operations::complement(&resolved, work_limit)?
        }
        Node::Char(c) => basic::char(*c),
        Node::CharRange(lo, hi) => basic::char_range(*lo, *hi),
        Node::AnyChar => basic::any_char(),
        Node::Empty => basic::empty(),
        Node::String(s) => basic::string(s),
        Node::AnyString => basic::any_string(),
        Node::AutomatonRef(name, pos) => resolve(name, *pos, named, provider)?,
        Node::Interval(lo, hi, digits, pos) => {
            basic::decimal_interval(*lo, *hi, *digits).map_err(|msg| RegexError::new(*pos, msg))?
        }
    };
    Ok(operations::minimize(&built, work_limit)?)
}

fn lower_all(
    nodes: &[Node],
    named: &NamedAutomata,
    provider: Option<&dyn AutomatonProvider>,
    work_limit: usize,
) -> Result<Vec<Automaton>, CompileError> {
    nodes.iter().map(|n| lower(n, named, provider, work_limit)).collect()
}

fn resolve(
    name: &str,
    pos: usize,
    named: &NamedAutomata,
    provider: Option<&dyn AutomatonProvider>,
) -> Result<Automaton, CompileError> {
    if let Some(a) = named.get(name) {
        return Ok(a.clone());
    }
    if let Some(a) = provider.and_then(|p| p.get_automaton(name)) {
        return Ok(a);
    }
    error!("unresolved named automaton '{name}' referenced at position {pos}");
    Err(CompileError::Regex(RegexError::new(pos, format!("unknown named automaton '{name}'"))))
}

#[cfg(test)]
mod tests {
    use {super::*, crate::automaton::operations::run, pretty_assertions::assert_eq, test_log::test};

    fn c(pattern: &str) -> Automaton {
        compile(pattern, SyntaxFlags::default(), &NamedAutomata::new(), None, 10_000).unwrap()
    }

    #[test]
    fn compiles_and_runs_a_simple_alternation() {
        let a = c("ab*c");
        assert!(run(&a, "ac"));
        assert!(run(&a, "abc"));
        assert!(run(&a, "abbbc"));
        assert!(!run(&a, "ab"));
    }

    #[test]
    fn compiles_repetition_ranges() {
        let a = c("a{3,5}");
        assert!(!run(&a, "aa"));
        for n in 3..=5 {
            assert!(run(&a, &"a".repeat(n)));
        }
        assert!(!run(&a, &"a".repeat(6)));
    }

    #[test]
    fn named_automaton_reference_resolves_from_the_named_map() {
        let mut named = NamedAutomata::new();
        named.insert("digits".to_string(), basic::decimal_interval(0, 9, 1).unwrap());
        let a = compile("x<digits>", SyntaxFlags::default(), &named, None, 10_000).unwrap();
        assert!(run(&a, "x5"));
        assert!(!run(&a, "x"));
    }

    struct StaticProvider;
    impl AutomatonProvider for StaticProvider {
        fn get_automaton(&self, name: &str) -> Option<Automaton> {
            (name == "greeting").then(|| basic::string(&"hi".encode_utf16().collect::<Vec<_>>()))
        }
    }

    #[test]
    fn named_automaton_reference_falls_back_to_the_provider() {
        let a = compile("<greeting>", SyntaxFlags::default(), &NamedAutomata::new(), Some(&StaticProvider), 10_000).unwrap();
        assert!(run(&a, "hi"));
    }

    #[test]
    fn unresolved_named_automaton_reference_is_a_compile_error() {
        let err = compile("<missing>", SyntaxFlags::default(), &NamedAutomata::new(), None, 10_000).unwrap_err();
        assert!(matches!(err, CompileError::Regex(_)));
    }

    #[test]
    fn malformed_pattern_is_a_compile_error() {
        assert!(compile("[abc", SyntaxFlags::default(), &NamedAutomata::new(), None, 10_000).is_err());
    }
}
