//! # Matrix Views
//!
//! Read-only adapters over a call matrix: a contiguous subset view used
//! for per-chromosome slicing and a reverse view used by the reverse
//! greedy scan. Views borrow the underlying matrix and never outlive it;
//! every mutator fails with `UnsupportedOnView`.

use std::borrow::Cow;
use std::sync::Arc;

use crate::data::matrix::{CallMatrix, CallMatrixMut};
use crate::error::{PhyloscanError, Result};

fn slice_cow<T: Clone>(cow: Cow<'_, [T]>, start: usize, len: usize) -> Cow<'_, [T]> {
    match cow {
        Cow::Borrowed(values) => Cow::Borrowed(&values[start..start + len]),
        Cow::Owned(values) => Cow::Owned(values[start..start + len].to_vec()),
    }
}

fn reverse_cow<T: Clone>(cow: Cow<'_, [T]>) -> Cow<'_, [T]> {
    let mut values = cow.into_owned();
    values.reverse();
    Cow::Owned(values)
}

/// A read-only view over a contiguous run of SNP rows
#[derive(Clone, Copy, Debug)]
pub struct SubsetView<'a, M: CallMatrix> {
    matrix: &'a M,
    start: u64,
    extent: u64,
}

impl<'a, M: CallMatrix> SubsetView<'a, M> {
    pub fn new(matrix: &'a M, start: u64, extent: u64) -> Self {
        debug_assert!(start + extent <= matrix.snp_count());
        Self {
            matrix,
            start,
            extent,
        }
    }

    /// First underlying row covered by this view
    pub fn start(&self) -> u64 {
        self.start
    }
}

impl<M: CallMatrix> CallMatrix for SubsetView<'_, M> {
    fn snp_count(&self) -> u64 {
        self.extent
    }

    fn sample_count(&self) -> u32 {
        self.matrix.sample_count()
    }

    fn snp_calls(&self, snp_index: u64) -> &[u8] {
        debug_assert!(snp_index < self.extent);
        self.matrix.snp_calls(self.start + snp_index)
    }

    fn sample_ids(&self) -> Option<&[Arc<str>]> {
        self.matrix.sample_ids()
    }

    fn snp_ids(&self) -> Option<Cow<'_, [Arc<str>]>> {
        self.matrix
            .snp_ids()
            .map(|ids| slice_cow(ids, self.start as usize, self.extent as usize))
    }

    fn chr_ids(&self) -> Option<Cow<'_, [Arc<str>]>> {
        self.matrix
            .chr_ids()
            .map(|ids| slice_cow(ids, self.start as usize, self.extent as usize))
    }

    fn bp_positions(&self) -> Option<Cow<'_, [i64]>> {
        self.matrix
            .bp_positions()
            .map(|positions| slice_cow(positions, self.start as usize, self.extent as usize))
    }

    fn a_alleles(&self) -> Option<Cow<'_, [char]>> {
        self.matrix
            .a_alleles()
            .map(|alleles| slice_cow(alleles, self.start as usize, self.extent as usize))
    }

    fn b_alleles(&self) -> Option<Cow<'_, [char]>> {
        self.matrix
            .b_alleles()
            .map(|alleles| slice_cow(alleles, self.start as usize, self.extent as usize))
    }

    fn build_id(&self) -> Option<&str> {
        self.matrix.build_id()
    }

    fn sorted_by_position(&self) -> bool {
        self.matrix.sorted_by_position()
    }
}

/// A read-only view with SNP order reversed.
///
/// Row `i` on the view maps to row `snp_count - 1 - i` on the underlying
/// matrix; per-SNP annotation arrays appear reversed, sample ids and the
/// byte order within each row are unchanged.
#[derive(Clone, Copy, Debug)]
pub struct ReverseView<'a, M: CallMatrix> {
    matrix: &'a M,
    snp_count: u64,
}

impl<'a, M: CallMatrix> ReverseView<'a, M> {
    pub fn new(matrix: &'a M) -> Self {
        let snp_count = matrix.snp_count();
        Self { matrix, snp_count }
    }
}

impl<M: CallMatrix> CallMatrix for ReverseView<'_, M> {
    fn snp_count(&self) -> u64 {
        self.snp_count
    }

    fn sample_count(&self) -> u32 {
        self.matrix.sample_count()
    }

    fn snp_calls(&self, snp_index: u64) -> &[u8] {
        self.matrix.snp_calls(self.snp_count - 1 - snp_index)
    }

    fn sample_ids(&self) -> Option<&[Arc<str>]> {
        self.matrix.sample_ids()
    }

    fn snp_ids(&self) -> Option<Cow<'_, [Arc<str>]>> {
        self.matrix.snp_ids().map(reverse_cow)
    }

    fn chr_ids(&self) -> Option<Cow<'_, [Arc<str>]>> {
        self.matrix.chr_ids().map(reverse_cow)
    }

    fn bp_positions(&self) -> Option<Cow<'_, [i64]>> {
        self.matrix.bp_positions().map(reverse_cow)
    }

    fn a_alleles(&self) -> Option<Cow<'_, [char]>> {
        self.matrix.a_alleles().map(reverse_cow)
    }

    fn b_alleles(&self) -> Option<Cow<'_, [char]>> {
        self.matrix.b_alleles().map(reverse_cow)
    }

    fn build_id(&self) -> Option<&str> {
        self.matrix.build_id()
    }

    fn sorted_by_position(&self) -> bool {
        // the view presents rows in descending position order
        false
    }
}

macro_rules! reject_mutation {
    ($view:ty) => {
        impl<M: CallMatrix> CallMatrixMut for $view {
            fn set_sample_ids(&mut self, _: Option<Vec<Arc<str>>>) -> Result<()> {
                Err(PhyloscanError::UnsupportedOnView)
            }

            fn set_call_rows(&mut self, _: Option<Vec<Vec<u8>>>) -> Result<()> {
                Err(PhyloscanError::UnsupportedOnView)
            }

            fn set_snp_ids(&mut self, _: Option<Vec<Arc<str>>>) -> Result<()> {
                Err(PhyloscanError::UnsupportedOnView)
            }

            fn set_chr_ids(&mut self, _: Option<Vec<Arc<str>>>) -> Result<()> {
                Err(PhyloscanError::UnsupportedOnView)
            }

            fn set_bp_positions(&mut self, _: Option<Vec<i64>>, _: Option<String>) -> Result<()> {
                Err(PhyloscanError::UnsupportedOnView)
            }

            fn set_a_alleles(&mut self, _: Option<Vec<char>>) -> Result<()> {
                Err(PhyloscanError::UnsupportedOnView)
            }

            fn set_b_alleles(&mut self, _: Option<Vec<char>>) -> Result<()> {
                Err(PhyloscanError::UnsupportedOnView)
            }

            fn set_sorted_by_position(&mut self, _: bool) -> Result<()> {
                Err(PhyloscanError::UnsupportedOnView)
            }
        }
    };
}

reject_mutation!(SubsetView<'_, M>);
reject_mutation!(ReverseView<'_, M>);
