//! Language-level automaton operations: union, concatenation, intersection, complement, optional,
//! repetition, containment, acceptance testing, and determinization.
//!
//! Every operation here takes its automaton arguments by shared reference and returns a freshly
//! built `Automaton` — see the Configuration note in `SPEC_FULL.md` §3 for why there is no
//! mutate-in-place flag to thread through these calls.
use {
    crate::{
        automaton::core::{Automaton, MAX_CHAR},
        automaton::state::StateId,
        error::TooComplexToDeterminizeError,
    },
    bitvec::bitvec,
    log::debug,
    std::collections::{HashMap, HashSet, VecDeque},
};

/// Default maximum effort [determinize] spends before giving up.
pub const DEFAULT_DETERMINIZE_WORK_LIMIT: usize = 10_000;

/// Clones `a` and expands it out of singleton form, if needed, so its states/transitions can be
/// copied into another automaton under construction.
fn materialize(a: &Automaton) -> Automaton {
    let mut a = a.clone();
    a.expand_singleton();
    a
}

/// Appends a materialized copy of `src`'s states/transitions into `dest`'s arena and returns the
/// id `src`'s initial state was given in `dest`.
fn copy_into(dest: &mut Automaton, src: &Automaton) -> StateId {
    let src = materialize(src);
    let offset = dest.num_states();
    for _ in 0..src.num_states() {
        dest.create_state();
    }
    for s in 0..src.num_states() {
        let from = StateId(s);
        if src.is_accept(from) {
            dest.set_accept(StateId(offset + s), true);
        }
        for t in src.transitions(from) {
            dest.add_transition(StateId(offset + s), StateId(offset + t.to.0), t.min, t.max);
        }
    }
    StateId(offset)
}

/// Returns `true` iff `a` accepts no strings.
pub fn is_empty(a: &Automaton) -> bool {
    if a.singleton().is_some() {
        return false;
    }
    if a.num_states() == 0 {
        return true;
    }
    let initial = a.initial();
    if !a.is_accept(initial) && a.transitions(initial).is_empty() {
        return true;
    }
    if a.is_accept(initial) {
        return false;
    }
    a.states().into_iter().all(|s| !a.is_accept(s))
}

/// Returns `true` iff `a` accepts exactly the empty string.
pub fn is_empty_string(a: &Automaton) -> bool {
    if let Some(word) = a.singleton() {
        return word.is_empty();
    }
    if a.num_states() == 0 {
        return false;
    }
    let initial = a.initial();
    a.is_accept(initial) && a.transitions(initial).is_empty()
}

/// Returns `true` iff `s` is accepted by `a`.
pub fn run(a: &Automaton, s: &str) -> bool {
    if let Some(word) = a.singleton() {
        return s.encode_utf16().eq(word.iter().copied());
    }
    if a.num_states() == 0 {
        return false;
    }

    if a.is_deterministic() {
        let mut state = a.initial();
        for c in s.encode_utf16() {
            match a.step(state, c) {
                Some(next) => state = next,
                None => return false,
            }
        }
        return a.is_accept(state);
    }

    // Two ping-pong frontier sets, indexed by state id, for the non-deterministic case.
    let n = a.num_states() as usize;
    let mut current = bitvec![0; n];
    current.set(a.initial().index(), true);
    let mut scratch = Vec::new();
    for c in s.encode_utf16() {
        let mut next = bitvec![0; n];
        for st in current.iter_ones() {
            scratch.clear();
            a.step_nondeterministic(StateId(st as u32), c, &mut scratch);
            for d in &scratch {
                next.set(d.index(), true);
            }
        }
        if !next.any() {
            return false;
        }
        current = next;
    }
    current.iter_ones().any(|st| a.is_accept(StateId(st as u32)))
}

/// Returns an automaton accepting the concatenation of the languages of `list`, in order.
pub fn concatenate(list: &[&Automaton]) -> Automaton {
    if list.is_empty() {
        return crate::automaton::basic::empty_string();
    }
    if list.iter().all(|a| a.singleton().is_some()) {
        let mut word = Vec::new();
        for a in list {
            word.extend_from_slice(a.singleton().unwrap());
        }
        return Automaton::from_singleton(word);
    }
    if list.iter().any(|a| is_empty(a)) {
        return crate::automaton::basic::empty();
    }

    let mut result = Automaton::new();
    let mut offsets = Vec::with_capacity(list.len());
    let mut materials = Vec::with_capacity(list.len());

    for (i, a) in list.iter().enumerate() {
        let offset = copy_into(&mut result, a);
        let m = materialize(a);
        if i + 1 < list.len() {
            // An interior operand's accept states are epsilon-splice points, not final accepts --
            // they only become accepting again if the tail chain reaches past the last operand.
            for s in 0..m.num_states() {
                if m.is_accept(StateId(s)) {
                    result.set_accept(StateId(offset.0 + s), false);
                }
            }
        }
        offsets.push(offset);
        materials.push(m);
    }

    for i in 0..materials.len() {
        let m = &materials[i];
        for s in 0..m.num_states() {
            if !m.is_accept(StateId(s)) {
                continue;
            }
            let source = StateId(offsets[i].0 + s);
            let mut j = i + 1;
            loop {
                if j >= materials.len() {
                    result.set_accept(source, true);
                    break;
                }
                result.add_epsilon(source, offsets[j]);
                if materials[j].is_accept(StateId(0)) {
                    j += 1;
                } else {
                    break;
                }
            }
        }
    }

    result.normalize_transition_order();
    result
}

/// Returns an automaton accepting the union of the languages of `list`.
pub fn union(list: &[&Automaton]) -> Automaton {
    let mut result = Automaton::new();
    let init = result.create_state();
    result.set_accept(init, false);

    let mut offsets = Vec::new();
    for a in list {
        if is_empty(a) {
            continue;
        }
        offsets.push(copy_into(&mut result, a));
    }
    for offset in offsets {
        result.add_epsilon(init, offset);
    }

    result.normalize_transition_order();
    remove_dead_states(&result)
}

/// Returns an automaton accepting the intersection of the languages of `a` and `b`, built by a
/// sorted-transition sweep over the reachable product states.
pub fn intersection(a: &Automaton, b: &Automaton) -> Automaton {
    if let Some(word) = a.singleton() {
        let s = String::from_utf16_lossy(word);
        return if run(b, &s) { a.clone() } else { crate::automaton::basic::empty() };
    }
    if let Some(word) = b.singleton() {
        let s = String::from_utf16_lossy(word);
        return if run(a, &s) { b.clone() } else { crate::automaton::basic::empty() };
    }
    if is_empty(a) || is_empty(b) {
        return crate::automaton::basic::empty();
    }

    let a = materialize(a);
    let b = materialize(b);

    let mut result = Automaton::new();
    let mut state_of: HashMap<(u32, u32), StateId> = HashMap::new();
    let mut worklist = VecDeque::new();

    let init = result.create_state();
    state_of.insert((0, 0), init);
    worklist.push_back((0u32, 0u32));
    result.set_accept(init, a.is_accept(StateId(0)) && b.is_accept(StateId(0)));

    while let Some((p, q)) = worklist.pop_front() {
        let from = state_of[&(p, q)];
        let ta = a.sorted_transitions(StateId(p), false);
        let tb = b.sorted_transitions(StateId(q), false);

        let mut j = 0usize;
        for ti in &ta {
            while j < tb.len() && (tb[j].max as u32) < ti.min as u32 {
                j += 1;
            }
            let mut k = j;
            while k < tb.len() && (tb[k].min as u32) <= ti.max as u32 {
                let lo = ti.min.max(tb[k].min);
                let hi = ti.max.min(tb[k].max);
                let key = (ti.to.0, tb[k].to.0);
                let dest = *state_of.entry(key).or_insert_with(|| {
                    let id = result.create_state();
                    result.set_accept(id, a.is_accept(ti.to) && b.is_accept(tb[k].to));
                    worklist.push_back(key);
                    id
                });
                result.add_transition(from, dest, lo, hi);
                k += 1;
            }
        }
    }

    result.normalize_transition_order();
    remove_dead_states(&result)
}

/// Returns a (deterministic) automaton accepting the intersection of `a` and the complement of
/// `b` -- i.e. strings in `a` but not in `b`. As a side effect `a`/`b` may need to be determinized.
pub fn minus(a: &Automaton, b: &Automaton, work_limit: usize) -> Result<Automaton, TooComplexToDeterminizeError> {
    if is_empty(a) {
        Ok(crate::automaton::basic::empty())
    } else if is_empty(b) {
        Ok(a.clone())
    } else {
        Ok(intersection(a, &complement(b, work_limit)?))
    }
}

/// Returns a (deterministic) automaton accepting the complement of the language of `a`.
pub fn complement(a: &Automaton, work_limit: usize) -> Result<Automaton, TooComplexToDeterminizeError> {
    let mut a = determinize(a, work_limit)?;
    a.totalize();
    for s in a.states() {
        let accept = a.is_accept(s);
        a.set_accept(s, !accept);
    }
    Ok(remove_dead_states(&a))
}

/// Returns an automaton accepting the empty string union the language of `a`.
pub fn optional(a: &Automaton) -> Automaton {
    let mut result = Automaton::new();
    let init = result.create_state();
    result.set_accept(init, true);
    if !is_empty(a) {
        let offset = copy_into(&mut result, a);
        result.add_epsilon(init, offset);
    }
    result.normalize_transition_order();
    result
}

/// Returns an automaton accepting the Kleene star of the language of `a`.
pub fn repeat(a: &Automaton) -> Automaton {
    if is_empty(a) {
        return a.clone();
    }
    let mut result = Automaton::new();
    let init = result.create_state();
    result.set_accept(init, true);
    let offset = copy_into(&mut result, a);
    result.add_epsilon(init, offset);

    let m = materialize(a);
    for s in 0..m.num_states() {
        if m.is_accept(StateId(s)) {
            result.add_epsilon(StateId(offset.0 + s), init);
        }
    }
    result.normalize_transition_order();
    result
}

/// Returns an automaton accepting `n` or more concatenated repetitions of the language of `a`.
pub fn repeat_n(a: &Automaton, n: usize) -> Automaton {
    let star = repeat(a);
    if n == 0 {
        return star;
    }
    let mut list: Vec<&Automaton> = (0..n).map(|_| a).collect();
    list.push(&star);
    concatenate(&list)
}

/// Returns an automaton accepting between `n` and `m` (inclusive) concatenated repetitions of the
/// language of `a`. `n > m` is the empty language.
pub fn repeat_range(a: &Automaton, n: usize, m: usize) -> Automaton {
    if n > m {
        return crate::automaton::basic::empty();
    }

    let base = if n == 0 {
        crate::automaton::basic::empty_string()
    } else {
        let list: Vec<&Automaton> = (0..n).map(|_| a).collect();
        concatenate(&list)
    };

    if m == n {
        return base;
    }

    let mut result = Automaton::new();
    let offset0 = copy_into(&mut result, &base);
    let base_m = materialize(&base);
    let mut chain_points: Vec<StateId> =
        (0..base_m.num_states()).filter(|&s| base_m.is_accept(StateId(s))).map(|s| StateId(offset0.0 + s)).collect();

    for _ in n..m {
        let offset = copy_into(&mut result, a);
        for &p in &chain_points {
            result.add_epsilon(p, offset);
        }
        let am = materialize(a);
        chain_points = (0..am.num_states()).filter(|&s| am.is_accept(StateId(s))).map(|s| StateId(offset.0 + s)).collect();
    }

    result.normalize_transition_order();
    result
}

/// Returns a fresh automaton keeping only `a`'s live states (reachable from the initial state and
/// able to reach an accept state), renumbered densely.
pub fn remove_dead_states(a: &Automaton) -> Automaton {
    let a = materialize(a);
    let live = a.live_states();
    let mut map: Vec<Option<StateId>> = vec![None; a.num_states() as usize];
    let mut result = Automaton::new();

    for s in 0..a.num_states() {
        if live[s as usize] {
            map[s as usize] = Some(result.create_state());
        }
    }
    for s in 0..a.num_states() {
        if !live[s as usize] {
            continue;
        }
        let new_s = map[s as usize].unwrap();
        result.set_accept(new_s, a.is_accept(StateId(s)));
        for t in a.transitions(StateId(s)) {
            if live[t.to.index()] {
                result.add_transition(new_s, map[t.to.index()].unwrap(), t.min, t.max);
            }
        }
    }
    result.normalize_transition_order();
    result.set_deterministic(a.is_deterministic());
    result
}

/// Determinizes `a` via subset construction over [Automaton::start_points] partitions, spending at
/// most `work_limit` units of effort (subset cardinality accumulated across the worklist) before
/// giving up.
pub fn determinize(a: &Automaton, work_limit: usize) -> Result<Automaton, TooComplexToDeterminizeError> {
    if a.singleton().is_some() {
        return Ok(a.clone());
    }
    let a = materialize(&a.clone());
    if a.is_deterministic() || a.num_states() <= 1 {
        return Ok(a);
    }

    let mut result = Automaton::new();
    let mut state_of: HashMap<Vec<u32>, StateId> = HashMap::new();
    let mut worklist: VecDeque<Vec<u32>> = VecDeque::new();

    let initial_subset = vec![0u32];
    let init = result.create_state();
    result.set_accept(init, a.is_accept(StateId(0)));
    state_of.insert(initial_subset.clone(), init);
    worklist.push_back(initial_subset);

    let mut effort = 0usize;
    let effort_limit = work_limit.saturating_mul(10).max(1);

    while let Some(subset) = worklist.pop_front() {
        effort += subset.len();
        if effort >= effort_limit {
            debug!("determinize exceeded effort limit {effort_limit} (work_limit={work_limit}) with {} subsets queued", worklist.len());
            return Err(TooComplexToDeterminizeError::new(work_limit));
        }
        let from = state_of[&subset];

        let mut points = std::collections::BTreeSet::new();
        for &s in &subset {
            for t in a.transitions(StateId(s)) {
                points.insert(t.min as u32);
                if (t.max as u32) < MAX_CHAR {
                    points.insert(t.max as u32 + 1);
                }
            }
        }
        if points.is_empty() {
            continue;
        }
        let points: Vec<u32> = points.into_iter().collect();

        for w in 0..points.len() {
            let lo = points[w];
            let hi = if w + 1 < points.len() { points[w + 1] - 1 } else { MAX_CHAR };

            let mut dest_set = std::collections::BTreeSet::new();
            let mut scratch = Vec::new();
            for &s in &subset {
                scratch.clear();
                a.step_nondeterministic(StateId(s), lo as u16, &mut scratch);
                dest_set.extend(scratch.iter().map(|d| d.0));
            }
            if dest_set.is_empty() {
                continue;
            }
            let dest_vec: Vec<u32> = dest_set.into_iter().collect();
            let accepting = dest_vec.iter().any(|&s| a.is_accept(StateId(s)));
            let dest_id = *state_of.entry(dest_vec.clone()).or_insert_with(|| {
                let id = result.create_state();
                result.set_accept(id, accepting);
                worklist.push_back(dest_vec);
                id
            });
            result.add_transition(from, dest_id, lo as u16, hi as u16);
        }
    }

    result.set_deterministic(true);
    result.normalize_transition_order();
    Ok(result)
}

/// Returns `true` iff the language of `a` is a subset of the language of `b`. Both automata must
/// already be deterministic.
pub fn subset_of(a: &Automaton, b: &Automaton) -> bool {
    let a = materialize(a);
    let b = materialize(b);
    assert!(a.is_deterministic(), "a must be deterministic");
    assert!(b.is_deterministic(), "b must be deterministic");

    if a.num_states() == 0 {
        return true;
    }
    if b.num_states() == 0 {
        return is_empty(&a);
    }

    let mut worklist = VecDeque::new();
    let mut visited: HashSet<(u32, u32)> = HashSet::new();
    worklist.push_back((0u32, 0u32));
    visited.insert((0, 0));

    while let Some((p, q)) = worklist.pop_front() {
        if a.is_accept(StateId(p)) && !b.is_accept(StateId(q)) {
            return false;
        }
        let ta = a.sorted_transitions(StateId(p), false);
        let tb = b.sorted_transitions(StateId(q), false);

        let mut k = 0usize;
        for ti in &ta {
            let mut cursor = ti.min as u32;
            while cursor <= ti.max as u32 {
                while k < tb.len() && (tb[k].max as u32) < cursor {
                    k += 1;
                }
                if k >= tb.len() || (tb[k].min as u32) > cursor {
                    return false;
                }
                let pair = (ti.to.0, tb[k].to.0);
                if visited.insert(pair) {
                    worklist.push_back(pair);
                }
                cursor = tb[k].max as u32 + 1;
            }
        }
    }
    true
}

/// Returns `true` iff `a` and `b` accept exactly the same language.
pub fn same_language(a: &Automaton, b: &Automaton) -> bool {
    subset_of(a, b) && subset_of(b, a)
}

#[cfg(test)]
mod tests {
    use {super::*, crate::automaton::basic, pretty_assertions::assert_eq, test_log::test};

    #[test]
    fn concatenate_chains_operands_in_order() {
        let a = concatenate(&[&basic::string(&[b'a' as u16]), &basic::string(&[b'b' as u16])]);
        assert!(run(&a, "ab"));
        assert!(!run(&a, "ba"));
        assert!(!run(&a, "a"));
    }

    #[test]
    fn concatenate_with_empty_operand_is_empty() {
        let a = concatenate(&[&basic::string(&[b'a' as u16]), &basic::empty()]);
        assert!(is_empty(&a));
    }

    #[test]
    fn concatenate_skips_interior_nullable_operand() {
        let optional_b = optional(&basic::char(b'b' as u16));
        let a = concatenate(&[&basic::char(b'a' as u16), &optional_b, &basic::char(b'c' as u16)]);
        assert!(run(&a, "ac"));
        assert!(run(&a, "abc"));
        assert!(!run(&a, "ab"));
    }

    #[test]
    fn union_accepts_either_operand() {
        let a = union(&[&basic::string(&[b'a' as u16]), &basic::string(&[b'b' as u16])]);
        assert!(run(&a, "a"));
        assert!(run(&a, "b"));
        assert!(!run(&a, "c"));
    }

    #[test]
    fn intersection_accepts_only_shared_strings() {
        let ab = basic::char_set(&[(b'a' as u16, b'b' as u16)]);
        let bc = basic::char_set(&[(b'b' as u16, b'c' as u16)]);
        let both = intersection(&ab, &bc);
        assert!(run(&both, "b"));
        assert!(!run(&both, "a"));
        assert!(!run(&both, "c"));
    }

    #[test]
    fn complement_of_any_string_is_empty() {
        let a = complement(&basic::any_string(), DEFAULT_DETERMINIZE_WORK_LIMIT).unwrap();
        assert!(is_empty(&a));
    }

    #[test]
    fn complement_flips_membership() {
        let a = basic::char(b'a' as u16);
        let comp = complement(&a, DEFAULT_DETERMINIZE_WORK_LIMIT).unwrap();
        assert!(!run(&comp, "a"));
        assert!(run(&comp, "b"));
        assert!(run(&comp, ""));
    }

    #[test]
    fn optional_accepts_empty_string_plus_operand() {
        let a = optional(&basic::char(b'a' as u16));
        assert!(run(&a, ""));
        assert!(run(&a, "a"));
        assert!(!run(&a, "aa"));
    }

    #[test]
    fn repeat_is_kleene_star() {
        let a = repeat(&basic::char(b'a' as u16));
        assert!(run(&a, ""));
        assert!(run(&a, "a"));
        assert!(run(&a, "aaaa"));
        assert!(!run(&a, "ab"));
    }

    #[test]
    fn repeat_n_requires_at_least_n_copies() {
        let a = repeat_n(&basic::char(b'a' as u16), 2);
        assert!(!run(&a, "a"));
        assert!(run(&a, "aa"));
        assert!(run(&a, "aaaaa"));
    }

    #[test]
    fn repeat_range_bounds_count() {
        let a = repeat_range(&basic::char(b'a' as u16), 3, 5);
        assert!(!run(&a, "aa"));
        assert!(run(&a, "aaa"));
        assert!(run(&a, "aaaa"));
        assert!(run(&a, "aaaaa"));
        assert!(!run(&a, "aaaaaa"));
    }

    #[test]
    fn repeat_range_zero_min_accepts_empty_string() {
        let a = repeat_range(&basic::char(b'a' as u16), 0, 2);
        assert!(run(&a, ""));
        assert!(run(&a, "a"));
        assert!(run(&a, "aa"));
        assert!(!run(&a, "aaa"));
    }

    #[test]
    fn repeat_range_inverted_bounds_is_empty() {
        let a = repeat_range(&basic::char(b'a' as u16), 5, 2);
        assert!(is_empty(&a));
    }

    #[test]
    fn determinize_merges_nondeterministic_choices() {
        let mut a = Automaton::new();
        let s0 = a.create_state();
        let s1 = a.create_state();
        let s2 = a.create_state();
        a.add_transition(s0, s1, b'a' as u16, b'a' as u16);
        a.add_transition(s0, s2, b'a' as u16, b'a' as u16);
        a.set_accept(s1, true);
        a.set_accept(s2, true);
        let d = determinize(&a, DEFAULT_DETERMINIZE_WORK_LIMIT).unwrap();
        assert!(d.is_deterministic());
        assert!(run(&d, "a"));
    }

    #[test]
    fn union_of_automaton_with_itself_is_same_language() {
        let a = basic::char_set(&[(b'a' as u16, b'z' as u16)]);
        let u = union(&[&a, &a]);
        assert!(same_language(&determinize(&u, DEFAULT_DETERMINIZE_WORK_LIMIT).unwrap(), &a));
    }

    #[test]
    fn intersection_of_automaton_with_its_complement_is_empty() {
        let a = basic::char_set(&[(b'a' as u16, b'z' as u16)]);
        let comp = complement(&a, DEFAULT_DETERMINIZE_WORK_LIMIT).unwrap();
        let both = intersection(&a, &comp);
        assert!(is_empty(&both));
    }
}
