//! Incremental minimal-acyclic-DFA (DAFSA) construction over a lexicographically sorted sequence
//! of strings, after Daciuk & Mihov.
use {
    crate::{automaton::core::Automaton, automaton::state::StateId, error::DafsaBuilderError},
    std::{cmp::Ordering, collections::HashMap},
};

/// Builds a minimal acyclic automaton from words added in non-decreasing lexicographic order.
///
/// Words are code-unit sequences, not `&str`, so callers get to pick the comparison order that
/// matches their encoding; [build] is the `&str` convenience wrapper.
pub struct DafsaBuilder {
    automaton: Automaton,
    register: HashMap<(bool, Vec<(u16, u32)>), StateId>,
    active_states: Vec<StateId>,
    previous: Option<Vec<u16>>,
    finished: bool,
}

impl DafsaBuilder {
    pub fn new() -> Self {
        let mut automaton = Automaton::new();
        let root = automaton.create_state();
        Self { automaton, register: HashMap::new(), active_states: vec![root], previous: None, finished: false }
    }

    /// Adds one word. Must be lexicographically `>=` every word added so far.
    pub fn add(&mut self, word: &[u16]) -> Result<(), DafsaBuilderError> {
        if self.finished {
            return Err(DafsaBuilderError::AlreadyFinished);
        }
        if let Some(prev) = &self.previous {
            match word.cmp(prev.as_slice()) {
                Ordering::Less => {
                    return Err(DafsaBuilderError::OutOfOrder {
                        previous: String::from_utf16_lossy(prev),
                        next: String::from_utf16_lossy(word),
                    })
                }
                Ordering::Equal => return Ok(()),
                Ordering::Greater => {}
            }
        }

        // Sorted input guarantees the new suffix only ever attaches past the shared prefix with
        // the previous word -- everything strictly past that point on the previous path is done
        // acquiring children and can be frozen.
        let common = match &self.previous {
            Some(prev) => prev.iter().zip(word.iter()).take_while(|(a, b)| a == b).count(),
            None => 0,
        };
        self.replace_or_register(common);

        self.active_states.truncate(common + 1);
        let mut cur = self.active_states[common];
        for &c in &word[common..] {
            let next = self.automaton.create_state();
            self.automaton.add_transition(cur, next, c, c);
            self.active_states.push(next);
            cur = next;
        }
        self.automaton.set_accept(cur, true);
        self.previous = Some(word.to_vec());
        Ok(())
    }

    /// Same-finality, same-outgoing-labels, same-outgoing-targets signature used to intern a
    /// state. Targets are already canonical register ids because children are always frozen
    /// before their parent (post-order).
    fn signature(&self, state: StateId) -> (bool, Vec<(u16, u32)>) {
        let mut children: Vec<(u16, u32)> =
            self.automaton.transitions(state).iter().map(|t| (t.min, t.to.index() as u32)).collect();
        children.sort_unstable();
        (self.automaton.is_accept(state), children)
    }

    fn replace_or_register(&mut self, common: usize) {
        for i in (common + 1..self.active_states.len()).rev() {
            let state = self.active_states[i];
            let parent = self.active_states[i - 1];
            let key = self.signature(state);
            if let Some(&canon) = self.register.get(&key) {
                if canon != state {
                    self.automaton.retarget(parent, state, canon);
                }
            } else {
                self.register.insert(key, state);
            }
        }
    }

    /// Finalizes the builder: replace-or-registers the remaining active path from the root, then
    /// compacts the scratch arena (dropping states orphaned by interning) into the result.
    pub fn finish(mut self) -> Automaton {
        self.replace_or_register(0);
        self.finished = true;
        let mut result = compact_reachable(&self.automaton);
        result.set_deterministic(true);
        result.normalize_transition_order();
        result
    }
}

impl Default for DafsaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn compact_reachable(a: &Automaton) -> Automaton {
    let order = a.states();
    let mut map: HashMap<u32, StateId> = HashMap::with_capacity(order.len());
    let mut result = Automaton::new();
    for &s in &order {
        map.insert(s.index() as u32, result.create_state());
    }
    for &s in &order {
        let new_s = map[&(s.index() as u32)];
        result.set_accept(new_s, a.is_accept(s));
        for t in a.transitions(s) {
            if let Some(&dest) = map.get(&(t.to.index() as u32)) {
                result.add_transition(new_s, dest, t.min, t.max);
            }
        }
    }
    result
}

/// Builds a minimal acyclic automaton over `words`, converting each to UTF-16 code units.
pub fn build<'a, I>(words: I) -> Result<Automaton, DafsaBuilderError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut builder = DafsaBuilder::new();
    for w in words {
        let units: Vec<u16> = w.encode_utf16().collect();
        builder.add(&units)?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use {super::*, crate::automaton::operations::run, pretty_assertions::assert_eq, test_log::test};

    const WORDS: &[&str] = &["car", "cars", "cat", "cats", "dog", "dogs"];

    #[test]
    fn accepts_exactly_the_inserted_words() {
        let a = build(WORDS.iter().copied()).unwrap();
        for w in WORDS {
            assert!(run(&a, w), "{w} should be accepted");
        }
        for absent in ["ca", "do", "dogss", "cart"] {
            assert!(!run(&a, absent), "{absent} should not be accepted");
        }
    }

    #[test]
    fn sharing_common_suffixes_keeps_state_count_below_total_characters() {
        let a = build(WORDS.iter().copied()).unwrap();
        let total_chars: usize = WORDS.iter().map(|w| w.len()).sum();
        assert!((a.num_states() as usize) < total_chars, "{} states, {total_chars} characters", a.num_states());
    }

    #[test]
    fn out_of_order_insertion_is_rejected() {
        let mut b = DafsaBuilder::new();
        b.add(&[b'b' as u16]).unwrap();
        let err = b.add(&[b'a' as u16]).unwrap_err();
        assert!(matches!(err, DafsaBuilderError::OutOfOrder { .. }));
    }

    #[test]
    fn duplicate_insertion_is_a_no_op() {
        let mut b = DafsaBuilder::new();
        b.add(&[b'a' as u16]).unwrap();
        b.add(&[b'a' as u16]).unwrap();
        let a = b.finish();
        assert!(run(&a, "a"));
    }

    #[test]
    fn empty_builder_produces_empty_language() {
        let a = DafsaBuilder::new().finish();
        assert!(!run(&a, ""));
        assert!(!run(&a, "a"));
    }
}
