//! # Genotype Call Matrix
//!
//! The core data contract: row-major access to per-sample call codes plus
//! the optional per-SNP annotation arrays. Storage is split into a read
//! capability (`CallMatrix`) and a mutable construction capability
//! (`CallMatrixMut`); views implement only the read side.

use std::borrow::Cow;
use std::sync::Arc;

use crate::data::chromosome::{parse_chromosome, ChromosomeRank};
use crate::data::views::{ReverseView, SubsetView};
use crate::error::{PhyloscanError, Result};

/// Read capability over a genotype call matrix.
///
/// One row per SNP, one column per sample. All per-SNP annotation arrays
/// are optional; when present their length equals the SNP count.
pub trait CallMatrix {
    /// Number of SNP rows
    fn snp_count(&self) -> u64;

    /// Number of sample columns
    fn sample_count(&self) -> u32;

    /// The row of call codes for one SNP
    fn snp_calls(&self, snp_index: u64) -> &[u8];

    /// Sample ids, one per column
    fn sample_ids(&self) -> Option<&[Arc<str>]>;

    /// SNP ids, one per row
    fn snp_ids(&self) -> Option<Cow<'_, [Arc<str>]>>;

    /// Chromosome ids, one per row
    fn chr_ids(&self) -> Option<Cow<'_, [Arc<str>]>>;

    /// Base-pair positions, one per row
    fn bp_positions(&self) -> Option<Cow<'_, [i64]>>;

    /// A alleles, one per row
    fn a_alleles(&self) -> Option<Cow<'_, [char]>>;

    /// B alleles, one per row
    fn b_alleles(&self) -> Option<Cow<'_, [char]>>;

    /// Genome build the bp positions refer to (opaque metadata)
    fn build_id(&self) -> Option<&str>;

    /// Hint that rows are in (chromosome, bp) ascending order
    fn sorted_by_position(&self) -> bool;

    /// A read-only view over a contiguous run of SNP rows
    fn subset_view(&self, start: u64, extent: u64) -> SubsetView<'_, Self>
    where
        Self: Sized,
    {
        SubsetView::new(self, start, extent)
    }

    /// A read-only view with SNP order reversed
    fn reverse_view(&self) -> ReverseView<'_, Self>
    where
        Self: Sized,
    {
        ReverseView::new(self)
    }

    /// Partition the matrix into maximal contiguous runs of rows sharing a
    /// chromosome id, in matrix order. Fails when chromosome ids are absent.
    fn chromosome_views(&self) -> Result<Vec<SubsetView<'_, Self>>>
    where
        Self: Sized,
    {
        let chr_ids = self.chr_ids().ok_or(PhyloscanError::MissingChromosomeIds)?;
        debug_assert_eq!(chr_ids.len() as u64, self.snp_count());
        let mut views = Vec::new();
        let mut start = 0;
        while start < chr_ids.len() {
            let mut end = start + 1;
            while end < chr_ids.len() && chr_ids[end] == chr_ids[start] {
                end += 1;
            }
            views.push(SubsetView::new(self, start as u64, (end - start) as u64));
            start = end;
        }
        Ok(views)
    }
}

/// Mutable construction capability over a call matrix.
///
/// Setting `None` deletes the array. Views reject every setter with
/// `UnsupportedOnView`.
pub trait CallMatrixMut: CallMatrix {
    fn set_sample_ids(&mut self, sample_ids: Option<Vec<Arc<str>>>) -> Result<()>;
    fn set_call_rows(&mut self, rows: Option<Vec<Vec<u8>>>) -> Result<()>;
    fn set_snp_ids(&mut self, snp_ids: Option<Vec<Arc<str>>>) -> Result<()>;
    fn set_chr_ids(&mut self, chr_ids: Option<Vec<Arc<str>>>) -> Result<()>;
    fn set_bp_positions(
        &mut self,
        bp_positions: Option<Vec<i64>>,
        build_id: Option<String>,
    ) -> Result<()>;
    fn set_a_alleles(&mut self, a_alleles: Option<Vec<char>>) -> Result<()>;
    fn set_b_alleles(&mut self, b_alleles: Option<Vec<char>>) -> Result<()>;
    fn set_sorted_by_position(&mut self, sorted: bool) -> Result<()>;
}

/// Copy every array and metadata field from one matrix into another
pub fn copy_call_matrix(from: &impl CallMatrix, to: &mut impl CallMatrixMut) -> Result<()> {
    let rows = (0..from.snp_count())
        .map(|i| from.snp_calls(i).to_vec())
        .collect();
    to.set_call_rows(Some(rows))?;
    to.set_sample_ids(from.sample_ids().map(<[Arc<str>]>::to_vec))?;
    to.set_snp_ids(from.snp_ids().map(Cow::into_owned))?;
    to.set_chr_ids(from.chr_ids().map(Cow::into_owned))?;
    to.set_bp_positions(
        from.bp_positions().map(Cow::into_owned),
        from.build_id().map(str::to_owned),
    )?;
    to.set_a_alleles(from.a_alleles().map(Cow::into_owned))?;
    to.set_b_alleles(from.b_alleles().map(Cow::into_owned))?;
    to.set_sorted_by_position(from.sorted_by_position())?;
    Ok(())
}

/// The in-memory call matrix implementation
#[derive(Clone, Debug, Default)]
pub struct GenotypeCallMatrix {
    a_alleles: Option<Vec<char>>,
    b_alleles: Option<Vec<char>>,
    sample_ids: Option<Vec<Arc<str>>>,
    rows: Vec<Vec<u8>>,
    snp_ids: Option<Vec<Arc<str>>>,
    chr_ids: Option<Vec<Arc<str>>>,
    bp_positions: Option<Vec<i64>>,
    build_id: Option<String>,
    sorted_by_position: bool,
}

impl GenotypeCallMatrix {
    /// Create an empty matrix to be filled through the setters
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable in-place sort of all rows and per-SNP arrays by
    /// (chromosome, bp position) under the chromosome ordering. Sets the
    /// sorted-by-position hint on success.
    pub fn sort_by_position(&mut self) -> Result<()> {
        let chr_ids = self
            .chr_ids
            .as_ref()
            .ok_or(PhyloscanError::MissingChromosomeIds)?;
        let bp_positions = self.bp_positions.as_ref().ok_or_else(|| {
            PhyloscanError::bad_input("bp positions are required to sort by position")
        })?;
        let keys: Vec<(ChromosomeRank, i64)> = chr_ids
            .iter()
            .zip(bp_positions)
            .map(|(chr, &bp)| Ok((parse_chromosome(chr)?, bp)))
            .collect::<Result<_>>()?;

        let mut order: Vec<usize> = (0..self.rows.len()).collect();
        order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));

        self.rows = reorder(std::mem::take(&mut self.rows), &order);
        self.snp_ids = self.snp_ids.take().map(|v| reorder(v, &order));
        self.chr_ids = self.chr_ids.take().map(|v| reorder(v, &order));
        self.bp_positions = self.bp_positions.take().map(|v| reorder(v, &order));
        self.a_alleles = self.a_alleles.take().map(|v| reorder(v, &order));
        self.b_alleles = self.b_alleles.take().map(|v| reorder(v, &order));
        self.sorted_by_position = true;
        Ok(())
    }
}

fn reorder<T>(values: Vec<T>, order: &[usize]) -> Vec<T> {
    debug_assert_eq!(values.len(), order.len());
    let mut slots: Vec<Option<T>> = values.into_iter().map(Some).collect();
    order
        .iter()
        .map(|&i| slots[i].take().expect("permutation indices are unique"))
        .collect()
}

impl CallMatrix for GenotypeCallMatrix {
    fn snp_count(&self) -> u64 {
        self.rows.len() as u64
    }

    fn sample_count(&self) -> u32 {
        self.rows.first().map_or_else(
            || self.sample_ids.as_ref().map_or(0, Vec::len) as u32,
            |row| row.len() as u32,
        )
    }

    fn snp_calls(&self, snp_index: u64) -> &[u8] {
        &self.rows[snp_index as usize]
    }

    fn sample_ids(&self) -> Option<&[Arc<str>]> {
        self.sample_ids.as_deref()
    }

    fn snp_ids(&self) -> Option<Cow<'_, [Arc<str>]>> {
        self.snp_ids.as_deref().map(Cow::Borrowed)
    }

    fn chr_ids(&self) -> Option<Cow<'_, [Arc<str>]>> {
        self.chr_ids.as_deref().map(Cow::Borrowed)
    }

    fn bp_positions(&self) -> Option<Cow<'_, [i64]>> {
        self.bp_positions.as_deref().map(Cow::Borrowed)
    }

    fn a_alleles(&self) -> Option<Cow<'_, [char]>> {
        self.a_alleles.as_deref().map(Cow::Borrowed)
    }

    fn b_alleles(&self) -> Option<Cow<'_, [char]>> {
        self.b_alleles.as_deref().map(Cow::Borrowed)
    }

    fn build_id(&self) -> Option<&str> {
        self.build_id.as_deref()
    }

    fn sorted_by_position(&self) -> bool {
        self.sorted_by_position
    }
}

impl CallMatrixMut for GenotypeCallMatrix {
    fn set_sample_ids(&mut self, sample_ids: Option<Vec<Arc<str>>>) -> Result<()> {
        self.sample_ids = sample_ids;
        Ok(())
    }

    fn set_call_rows(&mut self, rows: Option<Vec<Vec<u8>>>) -> Result<()> {
        self.rows = rows.unwrap_or_default();
        Ok(())
    }

    fn set_snp_ids(&mut self, snp_ids: Option<Vec<Arc<str>>>) -> Result<()> {
        debug_assert!(snp_ids.as_ref().map_or(true, |v| v.len() == self.rows.len()));
        self.snp_ids = snp_ids;
        Ok(())
    }

    fn set_chr_ids(&mut self, chr_ids: Option<Vec<Arc<str>>>) -> Result<()> {
        debug_assert!(chr_ids.as_ref().map_or(true, |v| v.len() == self.rows.len()));
        self.chr_ids = chr_ids;
        Ok(())
    }

    fn set_bp_positions(
        &mut self,
        bp_positions: Option<Vec<i64>>,
        build_id: Option<String>,
    ) -> Result<()> {
        debug_assert!(bp_positions
            .as_ref()
            .map_or(true, |v| v.len() == self.rows.len()));
        self.bp_positions = bp_positions;
        self.build_id = build_id;
        Ok(())
    }

    fn set_a_alleles(&mut self, a_alleles: Option<Vec<char>>) -> Result<()> {
        debug_assert!(a_alleles
            .as_ref()
            .map_or(true, |v| v.len() == self.rows.len()));
        self.a_alleles = a_alleles;
        Ok(())
    }

    fn set_b_alleles(&mut self, b_alleles: Option<Vec<char>>) -> Result<()> {
        debug_assert!(b_alleles
            .as_ref()
            .map_or(true, |v| v.len() == self.rows.len()));
        self.b_alleles = b_alleles;
        Ok(())
    }

    fn set_sorted_by_position(&mut self, sorted: bool) -> Result<()> {
        self.sorted_by_position = sorted;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::calls::{A_CALL, B_CALL};

    pub(crate) fn ids(names: &[&str]) -> Vec<Arc<str>> {
        names.iter().map(|&n| Arc::from(n)).collect()
    }

    pub(crate) fn make_matrix(
        rows: Vec<Vec<u8>>,
        chr_ids: &[&str],
        bp_positions: &[i64],
        sample_ids: &[&str],
    ) -> GenotypeCallMatrix {
        let mut matrix = GenotypeCallMatrix::new();
        matrix.set_call_rows(Some(rows)).unwrap();
        matrix.set_sample_ids(Some(ids(sample_ids))).unwrap();
        matrix.set_chr_ids(Some(ids(chr_ids))).unwrap();
        matrix
            .set_bp_positions(Some(bp_positions.to_vec()), None)
            .unwrap();
        matrix
    }

    #[test]
    fn test_counts_and_row_access() {
        let matrix = make_matrix(
            vec![vec![A_CALL, B_CALL], vec![B_CALL, B_CALL]],
            &["1", "1"],
            &[100, 200],
            &["S1", "S2"],
        );
        assert_eq!(matrix.snp_count(), 2);
        assert_eq!(matrix.sample_count(), 2);
        assert_eq!(matrix.snp_calls(1), &[B_CALL, B_CALL]);
    }

    #[test]
    fn test_setting_none_deletes_array() {
        let mut matrix = make_matrix(
            vec![vec![A_CALL, B_CALL]],
            &["1"],
            &[100],
            &["S1", "S2"],
        );
        assert!(matrix.chr_ids().is_some());
        matrix.set_chr_ids(None).unwrap();
        assert!(matrix.chr_ids().is_none());
        assert!(matches!(
            matrix.chromosome_views(),
            Err(PhyloscanError::MissingChromosomeIds)
        ));
    }

    #[test]
    fn test_copy_call_matrix() {
        let mut source = make_matrix(
            vec![vec![A_CALL, B_CALL], vec![B_CALL, A_CALL]],
            &["1", "2"],
            &[5, 9],
            &["S1", "S2"],
        );
        source.set_a_alleles(Some(vec!['G', 'T'])).unwrap();
        source.set_b_alleles(Some(vec!['C', 'A'])).unwrap();
        source
            .set_bp_positions(Some(vec![5, 9]), Some("build37".to_string()))
            .unwrap();

        let mut copy = GenotypeCallMatrix::new();
        copy_call_matrix(&source, &mut copy).unwrap();
        assert_eq!(copy.snp_calls(0), source.snp_calls(0));
        assert_eq!(copy.sample_ids(), source.sample_ids());
        assert_eq!(copy.chr_ids(), source.chr_ids());
        assert_eq!(copy.a_alleles(), source.a_alleles());
        assert_eq!(copy.build_id(), Some("build37"));
    }

    #[test]
    fn test_sort_by_position() {
        let mut matrix = make_matrix(
            vec![
                vec![A_CALL, B_CALL],
                vec![B_CALL, A_CALL],
                vec![A_CALL, A_CALL],
                vec![B_CALL, B_CALL],
            ],
            &["chrX", "chr2", "chr2", "chr1"],
            &[50, 900, 100, 7],
            &["S1", "S2"],
        );
        matrix
            .set_snp_ids(Some(ids(&["s0", "s1", "s2", "s3"])))
            .unwrap();
        assert!(!matrix.sorted_by_position());

        matrix.sort_by_position().unwrap();
        assert!(matrix.sorted_by_position());
        assert_eq!(matrix.chr_ids().unwrap().as_ref(), ids(&["chr1", "chr2", "chr2", "chrX"]));
        assert_eq!(matrix.bp_positions().unwrap().as_ref(), &[7, 100, 900, 50]);
        assert_eq!(matrix.snp_ids().unwrap().as_ref(), ids(&["s3", "s2", "s1", "s0"]));
        assert_eq!(matrix.snp_calls(0), &[B_CALL, B_CALL]);
    }

    #[test]
    fn test_sort_rejects_invalid_chromosome() {
        let mut matrix = make_matrix(
            vec![vec![A_CALL], vec![B_CALL]],
            &["chr1", "scaffold7"],
            &[1, 2],
            &["S1"],
        );
        assert!(matches!(
            matrix.sort_by_position(),
            Err(PhyloscanError::InvalidChromosome { .. })
        ));
    }
}
