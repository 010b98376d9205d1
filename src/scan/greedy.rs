//! # Greedy Compatibility Scan
//!
//! Partitions the SNP range into maximal left-extending compatible
//! intervals. Run forwards it yields the greedy partition; run over the
//! reverse view and mirrored back it yields the reverse greedy partition
//! the core-interval step pairs with.

use crate::data::interval::{reverse_indexed_intervals, IndexedSnpInterval};
use crate::data::matrix::CallMatrix;
use crate::scan::sdp::are_sdps_compatible;

/// Greedy scan over a matrix view.
///
/// The resulting intervals are contiguous, disjoint and cover the whole
/// SNP range of the view.
pub fn greedy_scan<M: CallMatrix>(matrix: &M) -> Vec<IndexedSnpInterval> {
    let snp_count = matrix.snp_count();
    let mut intervals = Vec::new();
    let mut interval_sdps: Vec<&[u8]> = Vec::new();

    let mut start = 0;
    while start < snp_count {
        interval_sdps.push(matrix.snp_calls(start));
        let mut next = start + 1;
        while next < snp_count
            && check_compatibility_and_add(&mut interval_sdps, matrix.snp_calls(next))
        {
            next += 1;
        }
        intervals.push(IndexedSnpInterval::new(start as u32, (next - start) as u32));
        interval_sdps.clear();
        start = next;
    }

    intervals
}

/// Greedy scan of the reversed matrix, mirrored back to forward indices
pub fn reverse_greedy_scan<M: CallMatrix>(matrix: &M) -> Vec<IndexedSnpInterval> {
    let mut intervals = greedy_scan(&matrix.reverse_view());
    reverse_indexed_intervals(&mut intervals, matrix.snp_count() as u32);
    intervals
}

/// Check the row against the running interval and add it when it extends
/// the interval. A row equal to one already accumulated is compatible by
/// definition and is not added again.
fn check_compatibility_and_add<'a>(interval_sdps: &mut Vec<&'a [u8]>, sdp_to_add: &'a [u8]) -> bool {
    for &current in interval_sdps.iter() {
        if sdp_to_add == current {
            return true;
        }
        if !are_sdps_compatible(sdp_to_add, current) {
            return false;
        }
    }
    interval_sdps.push(sdp_to_add);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::matrix::tests::make_matrix;
    use crate::data::matrix::GenotypeCallMatrix;
    use crate::scan::sdp::tests_support::rows;

    fn matrix_of(patterns: &[&str]) -> GenotypeCallMatrix {
        let call_rows = rows(patterns);
        let n = call_rows.len();
        let chr_ids: Vec<&str> = vec!["1"; n];
        let positions: Vec<i64> = (0..n as i64).map(|i| (i + 1) * 10).collect();
        let samples: Vec<String> = (0..patterns[0].len()).map(|i| format!("S{}", i + 1)).collect();
        let sample_refs: Vec<&str> = samples.iter().map(String::as_str).collect();
        make_matrix(call_rows, &chr_ids, &positions, &sample_refs)
    }

    fn assert_partition(intervals: &[IndexedSnpInterval], snp_count: u32) {
        let mut expected_start = 0;
        for interval in intervals {
            assert_eq!(interval.start(), expected_start);
            expected_start = interval.start() + interval.extent();
        }
        assert_eq!(expected_start, snp_count);
    }

    #[test]
    fn test_compatible_rows_form_one_interval() {
        let matrix = matrix_of(&["AABB", "AABB", "ABBB"]);
        let intervals = greedy_scan(&matrix);
        assert_eq!(intervals, vec![IndexedSnpInterval::new(0, 3)]);
    }

    #[test]
    fn test_incompatible_row_closes_the_interval() {
        // the last row observes all four gametes against row 0
        let matrix = matrix_of(&["AABB", "ABBB", "AABB", "BABA"]);
        let intervals = greedy_scan(&matrix);
        assert_eq!(
            intervals,
            vec![IndexedSnpInterval::new(0, 3), IndexedSnpInterval::new(3, 1)]
        );
        assert_partition(&intervals, 4);
    }

    #[test]
    fn test_duplicate_rows_do_not_grow_the_accumulator() {
        let matrix = matrix_of(&["AAAB", "AAAB", "AAAB"]);
        let intervals = greedy_scan(&matrix);
        assert_eq!(intervals, vec![IndexedSnpInterval::new(0, 3)]);
    }

    #[test]
    fn test_greedy_partition_covers_everything() {
        let matrix = matrix_of(&[
            "ABBB", "AABB", "ABAB", "ABBA", "AABB", "BBAB", "ABBB", "BABA",
        ]);
        let intervals = greedy_scan(&matrix);
        assert_partition(&intervals, 8);
    }

    #[test]
    fn test_reverse_greedy_mirrors_to_forward_indices() {
        let matrix = matrix_of(&["AABB", "ABBB", "AABB", "BABA"]);
        let intervals = reverse_greedy_scan(&matrix);
        assert_partition(&intervals, 4);
        // scanning backwards, BABA conflicts with AABB at row 2
        assert_eq!(
            intervals,
            vec![IndexedSnpInterval::new(0, 3), IndexedSnpInterval::new(3, 1)]
        );
    }

    #[test]
    fn test_empty_matrix_yields_no_intervals() {
        let matrix = GenotypeCallMatrix::new();
        assert!(greedy_scan(&matrix).is_empty());
    }
}
