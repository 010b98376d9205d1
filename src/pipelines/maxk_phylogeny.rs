//! # Max-K Phylogeny Pipeline
//!
//! Drives the whole scan: partitions the matrix into chromosome views,
//! orders them by chromosome, runs the max-K selection on each, builds
//! one perfect phylogeny per selected interval, and assembles the
//! `(chrID, bpStartPosition, bpEndPosition, newick)` output rows.
//!
//! Each chromosome is scanned single-threaded; independent chromosomes
//! may be fanned out across a rayon pool, with output order restored
//! afterwards.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::data::chromosome::parse_chromosome;
use crate::data::matrix::CallMatrix;
use crate::data::views::SubsetView;
use crate::error::{PhyloscanError, Result};
use crate::io::flatfile::FlatFileWriter;
use crate::phylo::builder::infer_perfect_phylogenies;
use crate::scan::maxk::max_k_scan;

/// Header row of the phylogeny interval output
pub const OUTPUT_HEADER: [&str; 4] = [
    "chrID",
    "bpStartPosition",
    "bpEndPosition",
    "newickPerfectPhylogeny",
];

/// Cooperative cancellation flag, polled between chromosomes and between
/// max-K intervals. Output emitted before cancellation stays valid.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// One output row of the phylogeny scan
#[derive(Clone, Debug, PartialEq)]
pub struct PhylogenyRecord {
    pub chr_id: Arc<str>,
    pub bp_start: i64,
    pub bp_end: i64,
    pub newick: String,
}

/// The max-K phylogeny scan over a whole call matrix
#[derive(Clone, Debug, Default)]
pub struct MaxKPhylogenyPipeline {
    continue_on_error: bool,
    parallel: bool,
    cancel: CancelToken,
}

impl MaxKPhylogenyPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep scanning remaining chromosomes when one fails
    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    /// Fan the per-chromosome scans out across the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Use an externally held cancellation token
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Scan every chromosome and return the output rows, chromosomes in
    /// chromosome order and intervals in ascending start order.
    pub fn run<M: CallMatrix + Sync>(&self, matrix: &M) -> Result<Vec<PhylogenyRecord>> {
        let mut views = matrix.chromosome_views()?;

        // order the views by chromosome before scanning so the output
        // rows come out in chromosome order
        let mut keyed = Vec::with_capacity(views.len());
        for view in views.drain(..) {
            let chr_ids = view.chr_ids().ok_or(PhyloscanError::MissingChromosomeIds)?;
            let rank = parse_chromosome(&chr_ids[0])?;
            keyed.push((rank, view));
        }
        keyed.sort_by_key(|&(rank, _)| rank);

        let scanned: Vec<(Arc<str>, Result<Vec<PhylogenyRecord>>)> = if self.parallel {
            keyed
                .par_iter()
                .map(|(_, view)| (chromosome_of(view), self.scan_view(view)))
                .collect()
        } else {
            keyed
                .iter()
                .map(|(_, view)| (chromosome_of(view), self.scan_view(view)))
                .collect()
        };

        let mut records = Vec::new();
        for (chromosome, result) in scanned {
            match result {
                Ok(chromosome_records) => records.extend(chromosome_records),
                Err(error) if self.continue_on_error => {
                    warn!(%chromosome, %error, "skipping chromosome after scan failure");
                }
                Err(error) => return Err(error),
            }
        }
        Ok(records)
    }

    /// Scan and write in one step
    pub fn run_to_writer<M, W>(
        &self,
        matrix: &M,
        writer: &mut FlatFileWriter<W>,
    ) -> Result<usize>
    where
        M: CallMatrix + Sync,
        W: Write,
    {
        let records = self.run(matrix)?;
        write_phylogeny_records(&records, writer)?;
        Ok(records.len())
    }

    fn scan_view<M: CallMatrix>(&self, view: &SubsetView<'_, M>) -> Result<Vec<PhylogenyRecord>> {
        if self.cancel.is_cancelled() {
            return Ok(Vec::new());
        }

        let chr_ids = view.chr_ids().ok_or(PhyloscanError::MissingChromosomeIds)?;
        let bp_positions = view.bp_positions().ok_or_else(|| {
            PhyloscanError::bad_input("bp positions are required for phylogeny output")
        })?;

        let intervals = max_k_scan(view);
        info!(
            chromosome = %chr_ids[0],
            snps = view.snp_count(),
            intervals = intervals.len(),
            "scanned chromosome"
        );

        let mut records = Vec::with_capacity(intervals.len());
        for interval in &intervals {
            if self.cancel.is_cancelled() {
                break;
            }
            let phylogeny = infer_perfect_phylogenies(view, std::slice::from_ref(interval))?
                .pop()
                .ok_or(PhyloscanError::EmptyPhylogeny)?;
            records.push(PhylogenyRecord {
                chr_id: Arc::clone(&chr_ids[interval.start() as usize]),
                bp_start: bp_positions[interval.start() as usize],
                bp_end: bp_positions[interval.end() as usize],
                newick: phylogeny.to_newick(),
            });
        }
        Ok(records)
    }
}

fn chromosome_of<M: CallMatrix>(view: &SubsetView<'_, M>) -> Arc<str> {
    view.chr_ids()
        .map(|ids| Arc::clone(&ids[0]))
        .unwrap_or_else(|| Arc::from(""))
}

/// Write the header plus one row per record
pub fn write_phylogeny_records<W: Write>(
    records: &[PhylogenyRecord],
    writer: &mut FlatFileWriter<W>,
) -> Result<()> {
    writer.write_row(&OUTPUT_HEADER)?;
    for record in records {
        writer.write_row(&[
            record.chr_id.to_string(),
            record.bp_start.to_string(),
            record.bp_end.to_string(),
            record.newick.clone(),
        ])?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::matrix::tests::make_matrix;
    use crate::data::matrix::GenotypeCallMatrix;
    use crate::scan::sdp::tests_support::rows;

    fn two_chromosome_matrix() -> GenotypeCallMatrix {
        // chrX rows first in the matrix; chr1 carries one internal conflict
        make_matrix(
            rows(&["AABB", "AAAB", "AABB", "ABAB", "ABBB"]),
            &["chrX", "chrX", "chr1", "chr1", "chr1"],
            &[100, 200, 10, 20, 30],
            &["S1", "S2", "S3", "S4"],
        )
    }

    #[test]
    fn test_chromosomes_come_out_in_chromosome_order() {
        let matrix = two_chromosome_matrix();
        let records = MaxKPhylogenyPipeline::new().run(&matrix).unwrap();
        assert!(!records.is_empty());
        let mut chromosomes: Vec<&str> = records.iter().map(|r| r.chr_id.as_ref()).collect();
        chromosomes.dedup();
        assert_eq!(chromosomes, vec!["chr1", "chrX"]);
    }

    #[test]
    fn test_records_carry_bp_bounds() {
        let matrix = make_matrix(
            rows(&["AABB", "AAAB"]),
            &["1", "1"],
            &[500, 900],
            &["S1", "S2", "S3", "S4"],
        );
        let records = MaxKPhylogenyPipeline::new().run(&matrix).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bp_start, 500);
        assert_eq!(records[0].bp_end, 900);
        assert_eq!(records[0].chr_id.as_ref(), "1");
    }

    #[test]
    fn test_failing_chromosome_aborts_by_default() {
        let matrix = make_matrix(
            rows(&["AABB", "AHBB"]),
            &["1", "1"],
            &[1, 2],
            &["S1", "S2", "S3", "S4"],
        );
        assert!(matches!(
            MaxKPhylogenyPipeline::new().run(&matrix),
            Err(PhyloscanError::NonBiallelicInWindow { .. })
        ));
    }

    #[test]
    fn test_continue_on_error_skips_the_chromosome() {
        let matrix = make_matrix(
            rows(&["AHBB", "AABB"]),
            &["1", "2"],
            &[1, 2],
            &["S1", "S2", "S3", "S4"],
        );
        let records = MaxKPhylogenyPipeline::new()
            .with_continue_on_error(true)
            .run(&matrix)
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].chr_id.as_ref(), "2");
    }

    #[test]
    fn test_cancelled_run_emits_nothing() {
        let matrix = two_chromosome_matrix();
        let cancel = CancelToken::new();
        cancel.cancel();
        let records = MaxKPhylogenyPipeline::new()
            .with_cancel_token(cancel)
            .run(&matrix)
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let matrix = two_chromosome_matrix();
        let sequential = MaxKPhylogenyPipeline::new().run(&matrix).unwrap();
        let parallel = MaxKPhylogenyPipeline::new()
            .with_parallel(true)
            .run(&matrix)
            .unwrap();
        assert_eq!(sequential, parallel);
    }
}
