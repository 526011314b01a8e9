//! Hopcroft's O(n log n) partition-refinement DFA minimization.
use {
    crate::{
        automaton::core::{Automaton, MAX_CHAR},
        automaton::operations::determinize,
        automaton::state::StateId,
        error::TooComplexToDeterminizeError,
    },
    log::debug,
    std::collections::{HashMap, HashSet, VecDeque},
};

/// Minimizes `a`: determinizes (spending at most `work_limit` effort), totalizes, refines the
/// accept/non-accept partition by Hopcroft's algorithm over the interval-class alphabet, and
/// rebuilds one state per surviving block.
pub fn minimize(a: &Automaton, work_limit: usize) -> Result<Automaton, TooComplexToDeterminizeError> {
    let a = determinize(a, work_limit)?;
    if a.singleton().is_some() || a.num_states() == 0 {
        return Ok(a);
    }

    let mut a = a;
    a.totalize();
    let n = a.num_states() as usize;

    // Every character inside one of these intervals behaves identically for every state, so the
    // interval (not the individual character) is the alphabet Hopcroft refines over.
    let points = a.start_points();
    let num_classes = points.len();
    debug!("minimizing {n}-state determinized automaton over {num_classes} interval classes");

    let mut trans = vec![vec![0usize; num_classes]; n];
    for s in 0..n {
        for (ci, &p) in points.iter().enumerate() {
            let dest = a.step(StateId(s as u32), p as u16).expect("totalized automaton must be total");
            trans[s][ci] = dest.index();
        }
    }
    let mut reverse: Vec<Vec<Vec<usize>>> = vec![vec![Vec::new(); n]; num_classes];
    for (s, row) in trans.iter().enumerate() {
        for (ci, &dest) in row.iter().enumerate() {
            reverse[ci][dest].push(s);
        }
    }

    let accept: Vec<bool> = (0..n).map(|s| a.is_accept(StateId(s as u32))).collect();
    let mut blocks: Vec<Vec<usize>> = Vec::new();
    let accepting: Vec<usize> = (0..n).filter(|&s| accept[s]).collect();
    let non_accepting: Vec<usize> = (0..n).filter(|&s| !accept[s]).collect();
    if !accepting.is_empty() {
        blocks.push(accepting);
    }
    if !non_accepting.is_empty() {
        blocks.push(non_accepting);
    }
    let mut partition = vec![0usize; n];
    for (bi, block) in blocks.iter().enumerate() {
        for &s in block {
            partition[s] = bi;
        }
    }

    let mut worklist: VecDeque<(usize, usize)> = VecDeque::new();
    if blocks.len() == 2 {
        let smaller = if blocks[0].len() <= blocks[1].len() { 0 } else { 1 };
        for ci in 0..num_classes {
            worklist.push_back((ci, smaller));
        }
    } else if blocks.len() == 1 {
        for ci in 0..num_classes {
            worklist.push_back((ci, 0));
        }
    }

    while let Some((ci, b)) = worklist.pop_front() {
        let mut y: HashSet<usize> = HashSet::new();
        for &state_in_b in &blocks[b] {
            y.extend(reverse[ci][state_in_b].iter().copied());
        }
        if y.is_empty() {
            continue;
        }

        let mut touched: HashMap<usize, Vec<usize>> = HashMap::new();
        for &s in &y {
            touched.entry(partition[s]).or_default().push(s);
        }

        for (block_id, in_y) in touched {
            if in_y.len() == blocks[block_id].len() {
                continue;
            }
            let in_y_set: HashSet<usize> = in_y.iter().copied().collect();
            let not_y: Vec<usize> = blocks[block_id].iter().copied().filter(|s| !in_y_set.contains(s)).collect();

            let new_block_id = blocks.len();
            blocks.push(in_y);
            blocks[block_id] = not_y;
            for &s in &blocks[block_id] {
                partition[s] = block_id;
            }
            for &s in &blocks[new_block_id] {
                partition[s] = new_block_id;
            }

            let smaller_id = if blocks[block_id].len() <= blocks[new_block_id].len() { block_id } else { new_block_id };
            for c in 0..num_classes {
                worklist.push_back((c, smaller_id));
            }
        }
    }

    let initial_block = partition[0];
    let mut order = Vec::with_capacity(blocks.len());
    order.push(initial_block);
    order.extend((0..blocks.len()).filter(|&bi| bi != initial_block));

    let mut result = Automaton::new();
    let mut block_state: Vec<Option<StateId>> = vec![None; blocks.len()];
    for &bi in &order {
        block_state[bi] = Some(result.create_state());
    }
    for &bi in &order {
        let block = &blocks[bi];
        let rep = block[0];
        let new_s = block_state[bi].unwrap();
        result.set_accept(new_s, accept[rep]);
        for ci in 0..num_classes {
            let dest_block = partition[trans[rep][ci]];
            let lo = points[ci];
            let hi = if ci + 1 < num_classes { points[ci + 1] - 1 } else { MAX_CHAR };
            result.add_transition(new_s, block_state[dest_block].unwrap(), lo as u16, hi as u16);
        }
    }

    debug!("minimization produced {} blocks from {n} states", blocks.len());
    result.set_deterministic(true);
    result.remove_dead_transitions();
    result.normalize_transition_order();
    Ok(result)
}
