//! Random string generation: sample one string from a compiled automaton's accepted language by
//! walking transitions chosen uniformly at each step.
use {
    crate::{
        automaton::core::Automaton,
        error::{CompileError, XegerError},
        regex::{self, AutomatonProvider, NamedAutomata, SyntaxFlags},
    },
    rand::Rng,
};

/// Compiles a pattern once, then produces any number of independent samples from its language.
pub struct Xeger {
    automaton: Automaton,
}

impl Xeger {
    /// Compiles `pattern` under this generator's default syntax options (every extension except
    /// `@`, since any-string patterns would make generation meaningless). A leading `^` and
    /// trailing `$` are stripped first -- this generator does not interpret anchors.
    pub fn new(pattern: &str, work_limit: usize) -> Result<Self, XegerError> {
        Self::with_flags(pattern, SyntaxFlags::generator_default(), &NamedAutomata::new(), None, work_limit)
    }

    /// As [Xeger::new], but with an explicit syntax-options bitset and named-automaton
    /// collaborators for `<name>` references.
    pub fn with_flags(
        pattern: &str,
        flags: SyntaxFlags,
        named: &NamedAutomata,
        provider: Option<&dyn AutomatonProvider>,
        work_limit: usize,
    ) -> Result<Self, XegerError> {
        if pattern.is_empty() {
            return Err(XegerError::EmptyPattern);
        }
        let stripped = pattern.strip_prefix('^').unwrap_or(pattern);
        let stripped = stripped.strip_suffix('$').unwrap_or(stripped);

        let automaton = regex::compile(stripped, flags, named, provider, work_limit).map_err(|e| match e {
            CompileError::Regex(r) => XegerError::Parse(r),
            CompileError::TooComplex(t) => XegerError::TooComplex(t),
        })?;
        Ok(Self { automaton })
    }

    /// Produces one string accepted by the compiled automaton.
    ///
    /// Each outgoing transition of the current state is one option, sorted by `(to, min, -max)`;
    /// an accepting state has an extra "stop" option at index 0. The upper bound of the random
    /// pick is *inclusive* of `transitions.len()` when the state accepts (the stop option) and
    /// exclusive otherwise -- getting this off by one skews the distribution.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Result<String, XegerError> {
        if let Some(word) = self.automaton.singleton() {
            return Ok(String::from_utf16_lossy(word));
        }
        if self.automaton.num_states() == 0 {
            return Err(XegerError::DeadEnd { state: 0 });
        }

        let mut units = Vec::new();
        let mut state = self.automaton.initial();
        loop {
            let transitions = self.automaton.sorted_transitions(state, true);
            let accepts = self.automaton.is_accept(state);
            if !accepts && transitions.is_empty() {
                return Err(XegerError::DeadEnd { state: state.index() as u32 });
            }

            let choice = if accepts { rng.gen_range(0..=transitions.len()) } else { rng.gen_range(0..transitions.len()) };
            if accepts && choice == 0 {
                break;
            }
            let t = if accepts { transitions[choice - 1] } else { transitions[choice] };
            units.push(rng.gen_range(t.min..=t.max));
            state = t.to;
        }
        Ok(String::from_utf16_lossy(&units))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::regex, pretty_assertions::assert_eq, rand::SeedableRng, rand::rngs::StdRng, test_log::test};

    fn sample(pattern: &str, seed: u64) -> String {
        let x = Xeger::new(pattern, 10_000).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        x.generate(&mut rng).unwrap()
    }

    #[test]
    fn generated_strings_are_accepted_by_the_same_pattern() {
        let automaton =
            regex::compile("a{3,5}", SyntaxFlags::generator_default(), &regex::NamedAutomata::new(), None, 10_000).unwrap();
        for seed in 0..20 {
            let s = sample("a{3,5}", seed);
            assert!(crate::automaton::operations::run(&automaton, &s), "{s:?} rejected");
        }
    }

    #[test]
    fn anchors_are_stripped_before_compiling() {
        let x = Xeger::new("^High|Medium|Low$", 10_000).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let s = x.generate(&mut rng).unwrap();
        assert!(["High", "Medium", "Low"].contains(&s.as_str()));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert!(matches!(Xeger::new("", 10_000), Err(XegerError::EmptyPattern)));
    }

    #[test]
    fn invalid_pattern_surfaces_a_parse_error() {
        assert!(matches!(Xeger::new("[abc", 10_000), Err(XegerError::Parse(_))));
    }

    #[test]
    fn singleton_pattern_always_generates_the_literal() {
        let x = Xeger::new("hello", 10_000).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(x.generate(&mut rng).unwrap(), "hello");
    }
}
