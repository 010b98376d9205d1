//! # Max-K Interval Selection
//!
//! Combines the forward greedy, reverse greedy and uber scans into the
//! final max-K partition: cores pin down where each interval must sit,
//! uber-cores list the candidates per core, and a backward dynamic
//! program picks the candidate sequence maximizing total extent.

use crate::data::interval::IndexedSnpInterval;
use crate::data::matrix::CallMatrix;
use crate::scan::greedy::{greedy_scan, reverse_greedy_scan};
use crate::scan::uber::uber_scan;

/// Run the whole max-K selection over a matrix view
pub fn max_k_scan<M: CallMatrix>(matrix: &M) -> Vec<IndexedSnpInterval> {
    let forward_intervals = greedy_scan(matrix);
    let reverse_intervals = reverse_greedy_scan(matrix);
    let uber_intervals = uber_scan(matrix);
    let cores = core_intervals(&forward_intervals, &reverse_intervals);
    let groups = uber_cores(&uber_intervals, &cores);
    max_k_intervals(&groups)
}

/// Pair up forward and reverse greedy intervals into core intervals.
///
/// The two lists always have equal length when produced from the same
/// matrix; the k-th core runs from the k-th forward start to the k-th
/// reverse end.
pub fn core_intervals(
    forward: &[IndexedSnpInterval],
    reverse: &[IndexedSnpInterval],
) -> Vec<IndexedSnpInterval> {
    assert_eq!(
        forward.len(),
        reverse.len(),
        "the forward and reverse interval lists should be the same size"
    );
    forward
        .iter()
        .zip(reverse)
        .map(|(f, r)| {
            debug_assert!(f.start() <= r.end());
            IndexedSnpInterval::new(f.start(), 1 + r.end() - f.start())
        })
        .collect()
}

/// Group the uber intervals by the single core each could represent.
///
/// An uber interval is a max-K candidate for core k iff it contains core
/// k and intersects neither of the neighboring cores. Every group comes
/// out non-empty and sorted by start index.
pub fn uber_cores(
    uber: &[IndexedSnpInterval],
    cores: &[IndexedSnpInterval],
) -> Vec<Vec<IndexedSnpInterval>> {
    assert!(
        uber.len() >= cores.len(),
        "the list of uber intervals should be at least as big as the list of core intervals"
    );

    let core_count = cores.len();
    let mut groups: Vec<Vec<IndexedSnpInterval>> = Vec::with_capacity(core_count);
    if core_count == 0 {
        return groups;
    }

    let mut core_index = 0;
    let mut current_group: Vec<IndexedSnpInterval> = Vec::new();
    for &uber_interval in uber {
        if uber_interval.start() > cores[core_index].end() {
            debug_assert!(!current_group.is_empty());
            groups.push(std::mem::take(&mut current_group));
            core_index += 1;
            if core_index >= core_count {
                break;
            }
        }

        let current_core = cores[core_index];
        debug_assert!(uber_interval.start() <= current_core.end());
        let clear_of_prev = core_index == 0 || !uber_interval.intersects(cores[core_index - 1]);
        let clear_of_next =
            core_index + 1 >= core_count || !uber_interval.intersects(cores[core_index + 1]);
        if uber_interval.contains(current_core) && clear_of_prev && clear_of_next {
            current_group.push(uber_interval);
        }
    }
    if !current_group.is_empty() {
        groups.push(current_group);
    }

    debug_assert_eq!(groups.len(), core_count);
    groups
}

/// Backward dynamic program over the uber-core groups.
///
/// Chooses one candidate per group so that consecutive picks are adjacent
/// or overlapping and the summed extent is maximal. Ties resolve to the
/// lowest candidate index, keeping the selection deterministic.
pub fn max_k_intervals(uber_cores: &[Vec<IndexedSnpInterval>]) -> Vec<IndexedSnpInterval> {
    let core_count = uber_cores.len();
    let mut max_k = Vec::with_capacity(core_count);
    if core_count == 0 {
        return max_k;
    }

    // sweep backwards accumulating cumulative extents and forward pointers
    let mut forward_pointers: Vec<Vec<usize>> = vec![Vec::new(); core_count - 1];
    let mut cumulative_extents: Vec<u64> = uber_cores[core_count - 1]
        .iter()
        .map(|interval| interval.extent() as u64)
        .collect();
    for i in (0..core_count - 1).rev() {
        let current_group = &uber_cores[i];
        let next_group = &uber_cores[i + 1];
        let mut current_pointers = vec![0usize; current_group.len()];
        let mut current_cumulative = vec![0u64; current_group.len()];

        for (j, &current_interval) in current_group.iter().enumerate() {
            let mut best = 0u64;
            for (k, &next_interval) in next_group.iter().enumerate() {
                let candidate = cumulative_extents[k] + current_interval.extent() as u64;
                if candidate > best && current_interval.end() + 1 >= next_interval.start() {
                    best = candidate;
                    current_cumulative[j] = candidate;
                    current_pointers[j] = k;
                }
            }
            debug_assert!(best > 0);
        }

        forward_pointers[i] = current_pointers;
        cumulative_extents = current_cumulative;
    }

    // the best chain starts at the candidate with the largest cumulative
    // extent; from there just hop through the forward pointers
    let mut pointer = 0;
    for (i, &extent) in cumulative_extents.iter().enumerate() {
        if extent > cumulative_extents[pointer] {
            pointer = i;
        }
    }
    max_k.push(uber_cores[0][pointer]);
    for (i, pointers) in forward_pointers.iter().enumerate() {
        pointer = pointers[pointer];
        max_k.push(uber_cores[i + 1][pointer]);
    }

    max_k
}
