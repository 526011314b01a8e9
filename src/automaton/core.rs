//! The `Automaton` arena: states, transitions, and the structural traversals every higher-level
//! operation builds on.
use {
    crate::automaton::{state::StateId, transition::Transition},
    bitvec::{bitvec, vec::BitVec},
    std::{
        cell::Cell,
        cmp::Ordering,
        collections::VecDeque,
    },
};

/// Smallest code unit this crate's automata operate over.
pub const MIN_CHAR: u32 = 0x0000;

/// Largest code unit this crate's automata operate over (the BMP ceiling).
pub const MAX_CHAR: u32 = 0xFFFF;

#[derive(Clone, Debug, Default)]
struct StateNode {
    accept: bool,
    transitions: Vec<Transition>,
}

/// A non-deterministic or deterministic finite automaton over closed `u16` character intervals.
///
/// States live in a flat arena (`Vec<StateNode>`); a [StateId] is simply an index into it, which
/// means cyclic automata need no reference counting and `Clone` is a plain `Vec` copy. State 0 is
/// the initial state whenever `num_states() > 0`. An automaton with zero states is the empty
/// language; see [Automaton::from_singleton] for the other degenerate fast path.
#[derive(Clone, Debug)]
pub struct Automaton {
    states: Vec<StateNode>,
    deterministic: bool,
    singleton: Option<Vec<u16>>,
    hash_code: Cell<Option<u64>>,
}

impl Default for Automaton {
    /// The empty-language automaton (no states).
    fn default() -> Self {
        Self { states: Vec::new(), deterministic: true, singleton: None, hash_code: Cell::new(None) }
    }
}

impl Automaton {
    /// A fresh automaton with zero states, accepting no strings.
    pub fn new() -> Self {
        Self::default()
    }

    /// The singleton fast path: an automaton accepting exactly the one string `s`, represented
    /// without materializing any state graph.
    pub fn from_singleton(s: impl Into<Vec<u16>>) -> Self {
        Self { states: Vec::new(), deterministic: true, singleton: Some(s.into()), hash_code: Cell::new(None) }
    }

    /// `Some(word)` if this automaton is in singleton form.
    pub fn singleton(&self) -> Option<&[u16]> {
        self.singleton.as_deref()
    }

    /// Realizes the singleton fast path (if any) into a linear chain of states, one transition
    /// per code unit, the last one accepting. A no-op if not in singleton form.
    pub fn expand_singleton(&mut self) {
        let Some(word) = self.singleton.take() else { return };
        self.states.clear();
        let mut cur = self.create_state();
        for &c in &word {
            let next = self.create_state();
            self.add_transition(cur, next, c, c);
            cur = next;
        }
        self.set_accept(cur, true);
        self.deterministic = true;
        self.invalidate_hash();
    }

    /// Creates a new, non-accepting state with no outgoing transitions and returns its id.
    pub fn create_state(&mut self) -> StateId {
        let id = StateId(self.states.len().try_into().expect("automaton grew beyond u32::MAX states"));
        self.states.push(StateNode::default());
        self.invalidate_hash();
        id
    }

    /// The number of states in the arena (0 for the empty-language automaton, unless this
    /// automaton is still in singleton form).
    #[inline]
    pub fn num_states(&self) -> u32 {
        self.states.len().try_into().expect("automaton grew beyond u32::MAX states")
    }

    /// The total number of transitions across all states.
    pub fn num_transitions(&self) -> usize {
        self.states.iter().map(|s| s.transitions.len()).sum()
    }

    /// The initial state. Only valid when `num_states() > 0`.
    ///
    /// # Panics
    /// Panics if this automaton has no states (the empty-language automaton has no initial
    /// state; callers should check [Automaton::num_states] or use [Automaton::singleton] first).
    #[inline]
    pub fn initial(&self) -> StateId {
        assert!(!self.states.is_empty(), "empty-language automaton has no initial state");
        StateId(0)
    }

    /// Marks (or unmarks) `state` as accepting.
    pub fn set_accept(&mut self, state: StateId, accept: bool) {
        self.states[state.index()].accept = accept;
        self.invalidate_hash();
    }

    /// Whether `state` is an accept state.
    #[inline]
    pub fn is_accept(&self, state: StateId) -> bool {
        self.states[state.index()].accept
    }

    /// Conservative guarantee from the producer of this automaton: if `true`, no state has two
    /// outgoing transitions with overlapping intervals. `false` is always a safe answer.
    #[inline]
    pub fn is_deterministic(&self) -> bool {
        self.deterministic
    }

    /// Lets a builder declare the determinism guarantee it can vouch for.
    pub fn set_deterministic(&mut self, deterministic: bool) {
        self.deterministic = deterministic;
    }

    /// Appends a transition `source -[min,max]-> dest`.
    pub fn add_transition(&mut self, source: StateId, dest: StateId, min: u16, max: u16) {
        self.states[source.index()].transitions.push(Transition::new(min, max, dest));
        self.invalidate_hash();
    }

    /// Merges `dest`'s *current* outgoing transitions (and its `accept` bit) into `source`.
    /// Epsilons are never materialized as a transition kind of their own: this call is the only
    /// place an epsilon edge ever exists, and it is gone again as soon as the call returns.
    ///
    /// `dest` must already have every transition it will ever have added to it.
    pub fn add_epsilon(&mut self, source: StateId, dest: StateId) {
        let dest_transitions = self.states[dest.index()].transitions.clone();
        let dest_accept = self.states[dest.index()].accept;
        let src = &mut self.states[source.index()];
        src.transitions.extend(dest_transitions);
        if dest_accept {
            src.accept = true;
        }
        self.invalidate_hash();
    }

    /// Rewrites every transition out of `source` whose destination is `old` to instead target
    /// `new`. Used by the DAFSA builder's replace-or-register step, where a freshly built state
    /// turns out to be structurally identical to one already in the register.
    pub(crate) fn retarget(&mut self, source: StateId, old: StateId, new: StateId) {
        for t in &mut self.states[source.index()].transitions {
            if t.to == old {
                t.to = new;
            }
        }
        self.invalidate_hash();
    }

    /// The outgoing transitions of `state`, in whatever order they were added.
    #[inline]
    pub fn transitions(&self, state: StateId) -> &[Transition] {
        &self.states[state.index()].transitions
    }

    /// A sorted copy of `state`'s outgoing transitions: by `(min, -max, to)` when `to_first` is
    /// `false`, or by `(to, min, -max)` when `to_first` is `true`.
    pub fn sorted_transitions(&self, state: StateId, to_first: bool) -> Vec<Transition> {
        let mut ts = self.states[state.index()].transitions.clone();
        if to_first {
            ts.sort_by(|a, b| a.to.cmp(&b.to).then(a.min.cmp(&b.min)).then(b.max.cmp(&a.max)));
        } else {
            ts.sort_by(|a, b| a.min.cmp(&b.min).then(b.max.cmp(&a.max)).then(a.to.cmp(&b.to)));
        }
        ts
    }

    /// Sorts every state's outgoing transitions by `(min, max, to)`. Every public constructor and
    /// operation in this crate calls this before handing an `Automaton` back to a caller, so
    /// `step`'s binary search and the sweep-based product constructions can rely on the ordering.
    pub(crate) fn normalize_transition_order(&mut self) {
        for state in &mut self.states {
            state.transitions.sort_by(|a, b| a.min.cmp(&b.min).then(a.max.cmp(&b.max)).then(a.to.cmp(&b.to)));
        }
    }

    fn invalidate_hash(&self) {
        self.hash_code.set(None);
    }

    /// `3 * num_states + 2 * num_transitions`, forced to be nonzero, cached until the next
    /// structural mutation.
    pub fn hash_code(&self) -> u64 {
        if let Some(h) = self.hash_code.get() {
            return h;
        }
        let h = (3 * self.num_states() as u64 + 2 * self.num_transitions() as u64).max(1);
        self.hash_code.set(Some(h));
        h
    }

    /// Deterministic lookup, assuming `is_deterministic()` and [Automaton::normalize_transition_order]
    /// have both held: binary-searches `state`'s sorted transitions for one whose interval
    /// contains `c`.
    pub fn step(&self, state: StateId, c: u16) -> Option<StateId> {
        let transitions = &self.states[state.index()].transitions;
        let idx = transitions.partition_point(|t| t.max < c);
        transitions.get(idx).filter(|t| t.min <= c).map(|t| t.to)
    }

    /// Non-deterministic lookup: appends every matching destination to `out`.
    pub fn step_nondeterministic(&self, state: StateId, c: u16, out: &mut Vec<StateId>) {
        for t in &self.states[state.index()].transitions {
            if t.min <= c && c <= t.max {
                out.push(t.to);
            }
        }
    }

    /// BFS from the initial state; the reachable states, in discovery order (initial first).
    pub fn states(&self) -> Vec<StateId> {
        if self.states.is_empty() {
            return Vec::new();
        }
        let mut seen = bitvec![0; self.states.len()];
        let mut order = Vec::new();
        let mut worklist = VecDeque::new();
        seen.set(0, true);
        worklist.push_back(StateId(0));
        while let Some(s) = worklist.pop_front() {
            order.push(s);
            for t in &self.states[s.index()].transitions {
                if !seen[t.to.index()] {
                    seen.set(t.to.index(), true);
                    worklist.push_back(t.to);
                }
            }
        }
        order
    }

    /// The reachable accept states.
    pub fn accept_states(&self) -> Vec<StateId> {
        self.states().into_iter().filter(|&s| self.is_accept(s)).collect()
    }

    /// States from which some accept state is reachable, intersected with states reachable from
    /// the initial state (a "live" state must be on some accepted string's path).
    pub fn live_states(&self) -> BitVec {
        let mut live = self.reachable_from_initial();
        live &= self.reachable_to_accept();
        live
    }

    fn reachable_from_initial(&self) -> BitVec {
        let n = self.states.len();
        let mut live = bitvec![0; n];
        if n == 0 {
            return live;
        }
        let mut worklist = VecDeque::new();
        live.set(0, true);
        worklist.push_back(StateId(0));
        while let Some(s) = worklist.pop_front() {
            for t in &self.states[s.index()].transitions {
                if !live[t.to.index()] {
                    live.set(t.to.index(), true);
                    worklist.push_back(t.to);
                }
            }
        }
        live
    }

    fn reachable_to_accept(&self) -> BitVec {
        let n = self.states.len();
        let mut reverse: Vec<Vec<StateId>> = vec![Vec::new(); n];
        for (i, state) in self.states.iter().enumerate() {
            for t in &state.transitions {
                reverse[t.to.index()].push(StateId(i as u32));
            }
        }
        let mut live = bitvec![0; n];
        let mut worklist = VecDeque::new();
        for (i, state) in self.states.iter().enumerate() {
            if state.accept {
                live.set(i, true);
                worklist.push_back(StateId(i as u32));
            }
        }
        while let Some(s) = worklist.pop_front() {
            for &pred in &reverse[s.index()] {
                if !live[pred.index()] {
                    live.set(pred.index(), true);
                    worklist.push_back(pred);
                }
            }
        }
        live
    }

    /// Sorted, unique interval-boundary characters over every reachable transition: for each
    /// `[min, max]`, contributes `min` and `max + 1` (capped at `MAX_CHAR + 1`); always includes
    /// `MIN_CHAR`. Drives subset construction and Hopcroft's splitter classes.
    pub fn start_points(&self) -> Vec<u32> {
        let mut points = std::collections::BTreeSet::new();
        points.insert(MIN_CHAR);
        for s in self.states() {
            for t in &self.states[s.index()].transitions {
                points.insert(t.min as u32);
                if (t.max as u32) < MAX_CHAR {
                    points.insert(t.max as u32 + 1);
                }
            }
        }
        points.into_iter().collect()
    }

    /// Adds a trap state with a `[MIN_CHAR, MAX_CHAR]` self-loop, and fills every gap in every
    /// (reachable, pre-existing) state's outgoing coverage with a transition into the trap.
    pub fn totalize(&mut self) {
        let points = self.start_points();
        let trap = self.create_state();
        self.add_transition(trap, trap, MIN_CHAR as u16, MAX_CHAR as u16);

        let existing_states: Vec<StateId> = (0..self.states.len() as u32).map(StateId).collect();
        for s in existing_states {
            if s == trap {
                continue;
            }
            let sorted = self.sorted_transitions(s, false);
            let mut next_min = MIN_CHAR;
            for t in &sorted {
                if (t.min as u32) > next_min {
                    self.add_transition(s, trap, next_min as u16, (t.min as u32 - 1) as u16);
                }
                next_min = (t.max as u32 + 1).max(next_min);
            }
            if next_min <= MAX_CHAR {
                self.add_transition(s, trap, next_min as u16, MAX_CHAR as u16);
            }
        }
        self.normalize_transition_order();
        self.invalidate_hash();
    }

    /// For each state, coalesces adjacent/overlapping outgoing intervals sharing a destination
    /// into a single interval. Post-condition: no two transitions out of the same state share a
    /// destination and touch or overlap.
    pub fn reduce(&mut self) {
        for state in &mut self.states {
            if state.transitions.len() <= 1 {
                continue;
            }
            state.transitions.sort_by(|a, b| a.to.cmp(&b.to).then(a.min.cmp(&b.min)));
            let mut reduced = Vec::with_capacity(state.transitions.len());
            let mut iter = state.transitions.iter().copied();
            let mut cur = iter.next().unwrap();
            for t in iter {
                if t.to == cur.to && t.min as u32 <= cur.max as u32 + 1 {
                    cur.max = cur.max.max(t.max);
                } else {
                    reduced.push(cur);
                    cur = t;
                }
            }
            reduced.push(cur);
            state.transitions = reduced;
        }
        self.normalize_transition_order();
        self.invalidate_hash();
    }

    /// Drops transitions whose target isn't live, then [Automaton::reduce]s.
    pub fn remove_dead_transitions(&mut self) {
        let live = self.live_states();
        for state in &mut self.states {
            state.transitions.retain(|t| live[t.to.index()]);
        }
        self.reduce();
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq, test_log::test};

    #[test]
    fn empty_automaton_has_no_states() {
        let a = Automaton::new();
        assert_eq!(a.num_states(), 0);
        assert!(a.singleton().is_none());
    }

    #[test]
    fn singleton_expands_into_linear_chain() {
        let mut a = Automaton::from_singleton(vec![b'h' as u16, b'i' as u16]);
        assert_eq!(a.singleton(), Some(&[b'h' as u16, b'i' as u16][..]));
        a.expand_singleton();
        assert!(a.singleton().is_none());
        assert_eq!(a.num_states(), 3);
        assert!(a.is_deterministic());
        let s1 = a.step(a.initial(), b'h' as u16).unwrap();
        let s2 = a.step(s1, b'i' as u16).unwrap();
        assert!(a.is_accept(s2));
    }

    #[test]
    fn step_binary_search_respects_interval_bounds() {
        let mut a = Automaton::new();
        let s0 = a.create_state();
        let s1 = a.create_state();
        a.add_transition(s0, s1, b'a' as u16, b'z' as u16);
        a.set_accept(s1, true);
        a.normalize_transition_order();
        assert_eq!(a.step(s0, b'm' as u16), Some(s1));
        assert_eq!(a.step(s0, b'A' as u16), None);
    }

    #[test]
    fn add_epsilon_copies_destination_transitions_and_accept() {
        let mut a = Automaton::new();
        let s0 = a.create_state();
        let s1 = a.create_state();
        let s2 = a.create_state();
        a.add_transition(s1, s2, b'x' as u16, b'x' as u16);
        a.set_accept(s1, true);
        a.add_epsilon(s0, s1);
        assert!(a.is_accept(s0));
        assert_eq!(a.transitions(s0).len(), 1);
        assert_eq!(a.transitions(s0)[0].to, s2);
    }

    #[test]
    fn totalize_fills_every_gap() {
        let mut a = Automaton::new();
        let s0 = a.create_state();
        let s1 = a.create_state();
        a.add_transition(s0, s1, b'b' as u16, b'b' as u16);
        a.set_accept(s1, true);
        a.totalize();
        for s in a.states() {
            let sorted = a.sorted_transitions(s, false);
            let mut next = MIN_CHAR;
            for t in &sorted {
                assert_eq!(t.min as u32, next, "gap before {next:#x}");
                next = t.max as u32 + 1;
            }
            assert_eq!(next, MAX_CHAR + 1);
        }
    }

    #[test]
    fn reduce_coalesces_touching_same_destination_intervals() {
        let mut a = Automaton::new();
        let s0 = a.create_state();
        let s1 = a.create_state();
        a.add_transition(s0, s1, b'a' as u16, b'c' as u16);
        a.add_transition(s0, s1, b'd' as u16, b'f' as u16);
        a.reduce();
        assert_eq!(a.transitions(s0).len(), 1);
        assert_eq!(a.transitions(s0)[0].min, b'a' as u16);
        assert_eq!(a.transitions(s0)[0].max, b'f' as u16);
    }

    #[test]
    fn live_states_excludes_states_that_cannot_reach_accept() {
        let mut a = Automaton::new();
        let s0 = a.create_state();
        let s1 = a.create_state();
        let dead = a.create_state();
        a.add_transition(s0, s1, b'a' as u16, b'a' as u16);
        a.add_transition(s0, dead, b'b' as u16, b'b' as u16);
        a.set_accept(s1, true);
        let live = a.live_states();
        assert!(live[s0.index()]);
        assert!(live[s1.index()]);
        assert!(!live[dead.index()]);
    }
}
