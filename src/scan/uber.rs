//! # Uber Scan
//!
//! Enumerates every maximal right-extending compatible run in a single
//! left-to-right sweep. Unlike the greedy partition, consecutive uber
//! intervals may overlap: after a conflict the next interval restarts
//! just past the conflicting SNP and the retained accumulator suffix is
//! already the valid prefix for it.

use crate::data::interval::IndexedSnpInterval;
use crate::data::matrix::CallMatrix;
use crate::scan::sdp::are_sdps_compatible;

/// One accumulated SDP with the index of the SNP that most recently
/// contributed it.
struct SdpIndexPair<'a> {
    sdp: &'a [u8],
    index: u64,
}

/// Uber scan over a matrix view.
///
/// Returns the ordered list of maximal compatible intervals covering the
/// SNP range; for every SNP the unique interval containing it is the
/// longest compatible run through it.
pub fn uber_scan<M: CallMatrix>(matrix: &M) -> Vec<IndexedSnpInterval> {
    let snp_count = matrix.snp_count();
    let mut intervals = Vec::new();
    if snp_count == 0 {
        return intervals;
    }

    let mut interval_sdps: Vec<SdpIndexPair<'_>> = Vec::new();
    let mut start = 0;
    for index in 0..snp_count {
        if let Some(conflict_index) =
            test_compatible_and_add(&mut interval_sdps, matrix.snp_calls(index), index)
        {
            intervals.push(IndexedSnpInterval::new(
                start as u32,
                (index - start) as u32,
            ));
            start = conflict_index + 1;
        }
    }
    intervals.push(IndexedSnpInterval::new(
        start as u32,
        (snp_count - start) as u32,
    ));

    intervals
}

/// Try to add an SDP to the accumulator, scanning from newest to oldest.
///
/// A row equal to a stored one refreshes that entry's index. On a
/// conflict, everything at and before the conflicting entry is dropped
/// (the retained suffix stays compatible with the new row) and the
/// conflict's source index is returned.
fn test_compatible_and_add<'a>(
    interval_sdps: &mut Vec<SdpIndexPair<'a>>,
    sdp_to_add: &'a [u8],
    sdp_index: u64,
) -> Option<u64> {
    for i in (0..interval_sdps.len()).rev() {
        let current = &interval_sdps[i];
        if sdp_to_add == current.sdp {
            interval_sdps.remove(i);
            interval_sdps.push(SdpIndexPair {
                sdp: sdp_to_add,
                index: sdp_index,
            });
            return None;
        }
        if !are_sdps_compatible(sdp_to_add, current.sdp) {
            let conflict_index = current.index;
            interval_sdps.drain(..=i);
            interval_sdps.push(SdpIndexPair {
                sdp: sdp_to_add,
                index: sdp_index,
            });
            return Some(conflict_index);
        }
    }

    interval_sdps.push(SdpIndexPair {
        sdp: sdp_to_add,
        index: sdp_index,
    });
    None
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

    fn iv(start: u32, extent: u32) -> IndexedSnpInterval {
        IndexedSnpInterval::new(start, extent)
    }

    #[test]
    fn test_fully_compatible_range_is_one_interval() {
        let matrix = matrix_of(&["AABB", "AAAB", "AABB"]);
        assert_eq!(uber_scan(&matrix), vec![iv(0, 3)]);
    }

    #[test]
    fn test_conflict_restarts_past_the_conflicting_snp() {
        // row 2 conflicts with row 0; rows 1..4 are mutually compatible
        let matrix = matrix_of(&["AABB", "AAAB", "ABAB", "AAAB"]);
        assert_eq!(uber_scan(&matrix), vec![iv(0, 2), iv(1, 3)]);
    }

    #[test]
    fn test_every_snp_is_covered() {
        let matrix = matrix_of(&[
            "ABBB", "AABB", "ABAB", "ABBA", "AABB", "BBAB", "ABBB", "BABA",
        ]);
        let intervals = uber_scan(&matrix);
        for snp in 0u32..8 {
            let covering = intervals
                .iter()
                .filter(|iv| iv.start() <= snp && snp <= iv.end())
                .count();
            assert!(covering >= 1, "SNP {snp} is uncovered");
        }
        // intervals are emitted in ascending start order
        for pair in intervals.windows(2) {
            assert!(pair[0].start() < pair[1].start());
        }
    }

    #[test]
    fn test_empty_matrix_yields_no_intervals() {
        let matrix = GenotypeCallMatrix::new();
        assert!(uber_scan(&matrix).is_empty());
    }
}
