//! Recursive-descent parser for the regex grammar, leftmost derivation, one character of lookahead.
use crate::{
    error::RegexError,
    regex::ast::{complement_ranges, ranges_to_node, Node, SyntaxFlags},
};

/// Parses one pattern into a [Node] tree under a fixed [SyntaxFlags] configuration.
pub struct Parser {
    chars: Vec<char>,
    pos: usize,
    flags: SyntaxFlags,
}

impl Parser {
    pub fn new(pattern: &str, flags: SyntaxFlags) -> Self {
        Self { chars: pattern.chars().collect(), pos: 0, flags }
    }

    /// Parses the whole pattern, failing if anything is left over afterward.
    pub fn parse(mut self) -> Result<Node, RegexError> {
        let node = self.parse_union()?;
        if self.more() {
            return Err(self.err(self.pos, format!("trailing content after expression: {:?}", self.remaining())));
        }
        Ok(node)
    }

    fn parse_union(&mut self) -> Result<Node, RegexError> {
        let first = self.parse_inter()?;
        if self.peek() == Some('|') {
            self.advance();
            let rest = self.parse_union()?;
            let mut branches = vec![first];
            match rest {
                Node::Union(list) => branches.extend(list),
                other => branches.push(other),
            }
            Ok(Node::Union(branches))
        } else {
            Ok(first)
        }
    }

    fn parse_inter(&mut self) -> Result<Node, RegexError> {
        let first = self.parse_concat()?;
        if self.flags.contains(SyntaxFlags::INTERSECTION) && self.peek() == Some('&') {
            self.advance();
            let rest = self.parse_inter()?;
            return Ok(Node::Intersection(Box::new(first), Box::new(rest)));
        }
        Ok(first)
    }

    fn parse_concat(&mut self) -> Result<Node, RegexError> {
        let first = self.parse_repeat()?;
        let stops_here = !self.more()
            || matches!(self.peek(), Some(')') | Some('|'))
            || (self.flags.contains(SyntaxFlags::INTERSECTION) && self.peek() == Some('&'));
        if stops_here {
            return Ok(first);
        }
        let rest = self.parse_concat()?;
        let mut parts = vec![first];
        match rest {
            Node::Concatenation(list) => parts.extend(list),
            other => parts.push(other),
        }
        Ok(Node::Concatenation(parts))
    }

    fn parse_repeat(&mut self) -> Result<Node, RegexError> {
        let mut node = self.parse_compl()?;
        loop {
            match self.peek() {
                Some('?') => {
                    self.advance();
                    node = Node::Optional(Box::new(node));
                }
                Some('*') => {
                    self.advance();
                    node = Node::Repeat(Box::new(node));
                }
                Some('+') => {
                    self.advance();
                    node = Node::RepeatMin(Box::new(node), 1);
                }
                Some('{') => {
                    let start = self.pos;
                    self.advance();
                    let n = self.parse_number(start)?;
                    if self.peek() == Some(',') {
                        self.advance();
                        if self.peek() == Some('}') {
                            self.advance();
                            node = Node::RepeatMin(Box::new(node), n);
                        } else {
                            let m = self.parse_number(start)?;
                            self.expect(start, '}')?;
                            node = Node::RepeatMinMax(Box::new(node), n, m);
                        }
                    } else {
                        self.expect(start, '}')?;
                        node = Node::RepeatMinMax(Box::new(node), n, n);
                    }
                }
                _ => break,
            }
        }
        Ok(node)
    }

    fn parse_compl(&mut self) -> Result<Node, RegexError> {
        if self.flags.contains(SyntaxFlags::COMPLEMENT) && self.peek() == Some('~') {
            self.advance();
            let inner = self.parse_compl()?;
            return Ok(Node::Complement(Box::new(inner)));
        }
        self.parse_char_class()
    }

    fn parse_char_class(&mut self) -> Result<Node, RegexError> {
        if self.peek() != Some('[') {
            return self.parse_simple();
        }
        let start = self.pos;
        self.advance();
        let negate = if self.peek() == Some('^') {
            self.advance();
            true
        } else {
            false
        };

        let mut ranges: Vec<(u16, u16)> = Vec::new();
        loop {
            match self.peek() {
                None => return Err(self.err(start, "unbalanced '['")),
                Some(']') => {
                    self.advance();
                    break;
                }
                _ => {
                    let lo = self.parse_class_char(start)?;
                    if self.peek() == Some('-') && !matches!(self.peek_at(1), None | Some(']')) {
                        self.advance();
                        let hi = self.parse_class_char(start)?;
                        if lo > hi {
                            return Err(self.err(start, "character range out of order"));
                        }
                        ranges.push((lo, hi));
                    } else {
                        ranges.push((lo, lo));
                    }
                }
            }
        }

        if negate {
            ranges = complement_ranges(&ranges);
        }
        Ok(ranges_to_node(ranges))
    }

    fn parse_class_char(&mut self, start: usize) -> Result<u16, RegexError> {
        match self.peek() {
            None => Err(self.err(start, "unbalanced '['")),
            Some('\\') => {
                self.advance();
                match self.peek() {
                    None => Err(self.err(start, "dangling escape in character class")),
                    Some(c) => {
                        self.advance();
                        Ok(c as u16)
                    }
                }
            }
            Some(c) => {
                self.advance();
                Ok(c as u16)
            }
        }
    }

    fn parse_simple(&mut self) -> Result<Node, RegexError> {
        let start = self.pos;
        match self.peek() {
            Some('.') => {
                self.advance();
                Ok(Node::CharRange(0x20, 0x7E))
            }
            Some('#') => {
                if !self.flags.contains(SyntaxFlags::EMPTY) {
                    return Err(self.err(start, "'#' (empty language) syntax is not enabled"));
                }
                self.advance();
                Ok(Node::Empty)
            }
            Some('@') => {
                if !self.flags.contains(SyntaxFlags::ANYSTRING) {
                    return Err(self.err(start, "'@' (any string) syntax is not enabled"));
                }
                self.advance();
                Ok(Node::AnyString)
            }
            Some('"') => {
                self.advance();
                let mut s = Vec::new();
                loop {
                    match self.peek() {
                        None => return Err(self.err(start, "unbalanced '\"'")),
                        Some('"') => {
                            self.advance();
                            break;
                        }
                        Some(c) => {
                            s.push(c as u16);
                            self.advance();
                        }
                    }
                }
                Ok(Node::String(s))
            }
            Some('(') => {
                self.advance();
                if self.peek() == Some('?') {
                    // Perl-style non-capturing flag marker: lax -- accept and ignore everything
                    // up to the ':'.
                    while self.more() && self.peek() != Some(':') {
                        self.advance();
                    }
                    self.expect(start, ':')?;
                }
                if self.peek() == Some(')') {
                    self.advance();
                    return Ok(Node::String(Vec::new()));
                }
                let inner = self.parse_union()?;
                self.expect(start, ')')?;
                Ok(inner)
            }
            Some('<') => self.parse_angle(),
            Some('\\') => self.parse_escape(start),
            Some(c) => {
                self.advance();
                Ok(Node::Char(c as u16))
            }
            None => Err(self.err(start, "unexpected end of pattern")),
        }
    }

    fn parse_angle(&mut self) -> Result<Node, RegexError> {
        let start = self.pos;
        self.advance(); // '<'
        let content_start = self.pos;
        let mut content = String::new();
        loop {
            match self.peek() {
                None => return Err(self.err(start, "unbalanced '<'")),
                Some('>') => {
                    self.advance();
                    break;
                }
                Some(c) => {
                    content.push(c);
                    self.advance();
                }
            }
        }

        let dash_count = content.matches('-').count();
        let all_digits = !content.is_empty() && content.chars().all(|c| c.is_ascii_digit());

        if dash_count == 1 {
            let idx = content.find('-').unwrap();
            let (lo_str, rest) = content.split_at(idx);
            let hi_str = &rest[1..];
            let valid = !lo_str.is_empty()
                && !hi_str.is_empty()
                && lo_str.chars().all(|c| c.is_ascii_digit())
                && hi_str.chars().all(|c| c.is_ascii_digit());
            if !valid {
                return Err(self.err(content_start, "malformed interval"));
            }
            if !self.flags.contains(SyntaxFlags::INTERVAL) {
                return Err(self.err(start, "interval syntax is not enabled"));
            }
            let a: u32 = lo_str.parse().map_err(|_| self.err(content_start, "interval bound out of range"))?;
            let b: u32 = hi_str.parse().map_err(|_| self.err(content_start, "interval bound out of range"))?;
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let digits = if lo_str.len() == hi_str.len() { lo_str.len() } else { 0 };
            return Ok(Node::Interval(lo, hi, digits, start));
        }
        if dash_count > 1 {
            return Err(self.err(content_start, "interval has more than one '-'"));
        }
        if all_digits {
            return Err(self.err(content_start, "interval is missing '-'"));
        }
        if !self.flags.contains(SyntaxFlags::AUTOMATON) {
            return Err(self.err(start, "named-automaton syntax is not enabled"));
        }
        Ok(Node::AutomatonRef(content, start))
    }

    fn parse_escape(&mut self, start: usize) -> Result<Node, RegexError> {
        self.advance(); // '\'
        match self.peek() {
            None => Err(self.err(start, "dangling escape")),
            Some('d') => {
                self.advance();
                Ok(ranges_to_node(vec![digits()]))
            }
            Some('D') => {
                self.advance();
                Ok(ranges_to_node(complement_ranges(&[digits()])))
            }
            Some('s') => {
                self.advance();
                Ok(ranges_to_node(whitespace()))
            }
            Some('S') => {
                self.advance();
                Ok(ranges_to_node(complement_ranges(&whitespace())))
            }
            Some('w') => {
                self.advance();
                Ok(ranges_to_node(word_chars()))
            }
            Some('W') => {
                self.advance();
                Ok(ranges_to_node(complement_ranges(&word_chars())))
            }
            Some(c) => {
                self.advance();
                Ok(Node::Char(c as u16))
            }
        }
    }

    fn parse_number(&mut self, start: usize) -> Result<u32, RegexError> {
        let mut s = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            s.push(self.peek().unwrap());
            self.advance();
        }
        if s.is_empty() {
            return Err(self.err(start, "expected a number in repetition bound"));
        }
        s.parse().map_err(|_| self.err(start, "repetition bound out of range"))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn more(&self) -> bool {
        self.pos < self.chars.len()
    }

    fn remaining(&self) -> String {
        self.chars[self.pos..].iter().collect()
    }

    fn err(&self, pos: usize, message: impl Into<String>) -> RegexError {
        RegexError::new(pos, message)
    }

    fn expect(&mut self, start: usize, c: char) -> Result<(), RegexError> {
        if self.peek() == Some(c) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(start, format!("expected '{c}'")))
        }
    }
}

fn digits() -> (u16, u16) {
    (b'0' as u16, b'9' as u16)
}

fn whitespace() -> Vec<(u16, u16)> {
    vec![(b' ' as u16, b' ' as u16), (b'\t' as u16, b'\t' as u16)]
}

fn word_chars() -> Vec<(u16, u16)> {
    vec![(b'A' as u16, b'Z' as u16), (b'a' as u16, b'z' as u16), (b'0' as u16, b'9' as u16), (b'_' as u16, b'_' as u16)]
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq, test_log::test};

    fn parse(pattern: &str) -> Node {
        Parser::new(pattern, SyntaxFlags::default()).parse().unwrap()
    }

    #[test]
    fn concatenation_and_union_nest_correctly() {
        assert!(matches!(parse("ab|c"), Node::Union(list) if list.len() == 2));
        assert!(matches!(parse("abc"), Node::Concatenation(list) if list.len() == 3));
    }

    #[test]
    fn repetition_operators_produce_the_right_tags() {
        assert!(matches!(parse("a?"), Node::Optional(_)));
        assert!(matches!(parse("a*"), Node::Repeat(_)));
        assert!(matches!(parse("a+"), Node::RepeatMin(_, 1)));
        assert!(matches!(parse("a{3}"), Node::RepeatMinMax(_, 3, 3)));
        assert!(matches!(parse("a{3,}"), Node::RepeatMin(_, 3)));
        assert!(matches!(parse("a{3,5}"), Node::RepeatMinMax(_, 3, 5)));
    }

    #[test]
    fn character_class_desugars_to_union_of_ranges() {
        assert!(matches!(parse("[abc]"), Node::Union(_)));
        assert!(matches!(parse("[a-c]"), Node::CharRange(lo, hi) if lo == b'a' as u16 && hi == b'c' as u16));
    }

    #[test]
    fn negated_character_class_complements_against_printable_ascii() {
        match parse("[^a]") {
            Node::Union(ranges) => assert!(ranges.len() > 1),
            other => panic!("expected a union, got {other:?}"),
        }
    }

    #[test]
    fn angle_bracket_distinguishes_interval_from_automaton_reference() {
        assert!(matches!(parse("<1-10>"), Node::Interval(1, 10, 0, _)));
        assert!(matches!(parse("<name>"), Node::AutomatonRef(ref n, _) if n == "name"));
    }

    #[test]
    fn interval_with_no_dash_that_looks_numeric_is_an_error() {
        let err = Parser::new("<123>", SyntaxFlags::default()).parse().unwrap_err();
        assert!(err.message.contains("missing '-'"));
    }

    #[test]
    fn interval_with_more_than_one_dash_is_an_error() {
        let err = Parser::new("<1-2-3>", SyntaxFlags::default()).parse().unwrap_err();
        assert!(err.message.contains("more than one"));
    }

    #[test]
    fn unbalanced_bracket_is_an_error() {
        assert!(Parser::new("[abc", SyntaxFlags::default()).parse().is_err());
    }

    #[test]
    fn disabled_syntax_extension_is_rejected() {
        let flags = SyntaxFlags::empty();
        assert!(Parser::new("a&b", flags).parse().is_err());
        assert!(Parser::new("~a", flags).parse().is_err());
        assert!(Parser::new("#", flags).parse().is_err());
        assert!(Parser::new("@", flags).parse().is_err());
        assert!(Parser::new("<name>", flags).parse().is_err());
        assert!(Parser::new("<1-2>", flags).parse().is_err());
    }

    #[test]
    fn trailing_content_after_a_complete_expression_is_an_error() {
        assert!(Parser::new("a)", SyntaxFlags::default()).parse().is_err());
    }

    #[test]
    fn shorthand_escapes_desugar_without_a_dedicated_tag() {
        assert!(matches!(parse("\\d"), Node::CharRange(lo, hi) if lo == b'0' as u16 && hi == b'9' as u16));
        assert!(matches!(parse("\\w"), Node::Union(_)));
    }
}
