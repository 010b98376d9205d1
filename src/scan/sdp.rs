//! # Sample Distribution Patterns
//!
//! Bitset representation of a SNP row (A maps to 1, B to 0) and the two
//! equivalent compatibility tests: the four-gamete test over raw call
//! rows and the disjoint-or-subset test over minority-normalized bitsets.

use bitvec::prelude::*;

use crate::data::calls::{A_CALL, B_CALL};

/// A sample distribution pattern: one bit per sample
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sdp {
    bits: BitVec<usize, Lsb0>,
}

impl Sdp {
    /// All-zero pattern over `sample_count` samples
    pub fn zeros(sample_count: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, sample_count),
        }
    }

    /// All-one pattern over `sample_count` samples
    pub fn all_ones(sample_count: usize) -> Self {
        Self {
            bits: BitVec::repeat(true, sample_count),
        }
    }

    /// Map a call row to bits (A set, B clear).
    ///
    /// Returns the index of the first sample whose call is neither A nor B.
    pub fn from_calls(calls: &[u8]) -> std::result::Result<Self, usize> {
        let mut bits = BitVec::repeat(false, calls.len());
        for (i, &call) in calls.iter().enumerate() {
            match call {
                A_CALL => bits.set(i, true),
                B_CALL => {}
                _ => return Err(i),
            }
        }
        Ok(Self { bits })
    }

    /// The minority-normalized pattern for a call row
    pub fn minority_normalized_from_calls(calls: &[u8]) -> std::result::Result<Self, usize> {
        let mut sdp = Self::from_calls(calls)?;
        sdp.minority_normalize();
        Ok(sdp)
    }

    /// Flip all bits iff ones outnumber zeros, or the halves are equal and
    /// bit 0 is set. Afterwards the set bits mark the minority allele and
    /// the popcount is at most half the sample count.
    pub fn minority_normalize(&mut self) {
        let ones = self.bits.count_ones();
        let zeros = self.bits.len() - ones;
        let bit0 = self.bits.first().map(|b| *b).unwrap_or(false);
        if ones > zeros || (ones == zeros && bit0) {
            for mut bit in self.bits.iter_mut() {
                *bit = !*bit;
            }
        }
    }

    /// Number of samples covered
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }

    /// True when no bit is set
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Read one sample's bit
    pub fn get(&self, index: usize) -> bool {
        self.bits[index]
    }

    /// Write one sample's bit
    pub fn set(&mut self, index: usize, value: bool) {
        self.bits.set(index, value);
    }

    /// True when the two patterns share any sample
    pub fn intersects(&self, other: &Sdp) -> bool {
        self.bits.iter_ones().any(|i| other.bits[i])
    }

    /// True when every sample of `self` also appears in `other`
    pub fn is_subset_of(&self, other: &Sdp) -> bool {
        self.bits.iter_ones().all(|i| other.bits[i])
    }

    /// Add every sample of `other` to `self`
    pub fn union_with(&mut self, other: &Sdp) {
        for i in other.bits.iter_ones() {
            self.bits.set(i, true);
        }
    }

    /// Indices of the set bits, ascending
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }
}

/// Four-gamete test over two raw call rows.
///
/// Considering only the positions where both rows carry an A or B call,
/// the rows are compatible unless all four ordered pairs (A,A), (A,B),
/// (B,A), (B,B) are observed.
pub fn are_sdps_compatible(sdp1: &[u8], sdp2: &[u8]) -> bool {
    debug_assert_eq!(sdp1.len(), sdp2.len());

    let mut observed_aa = false;
    let mut observed_ab = false;
    let mut observed_ba = false;
    let mut observed_bb = false;
    for (&call1, &call2) in sdp1.iter().zip(sdp2) {
        match (call1, call2) {
            (A_CALL, A_CALL) => observed_aa = true,
            (A_CALL, B_CALL) => observed_ab = true,
            (B_CALL, A_CALL) => observed_ba = true,
            (B_CALL, B_CALL) => observed_bb = true,
            _ => {}
        }
    }
    let four_gametes = observed_aa && observed_ab && observed_ba && observed_bb;

    #[cfg(debug_assertions)]
    if sdp1.iter().all(|&c| crate::data::calls::is_ab(c))
        && sdp2.iter().all(|&c| crate::data::calls::is_ab(c))
    {
        if let (Ok(n1), Ok(n2)) = (
            Sdp::minority_normalized_from_calls(sdp1),
            Sdp::minority_normalized_from_calls(sdp2),
        ) {
            debug_assert_eq!(!four_gametes, are_normalized_sdps_compatible(&n1, &n2));
        }
    }

    !four_gametes
}

/// Compatibility test over two minority-normalized patterns: compatible
/// iff disjoint or one is a subset of the other.
pub fn are_normalized_sdps_compatible(sdp1: &Sdp, sdp2: &Sdp) -> bool {
    !sdp1.intersects(sdp2) || sdp1.is_subset_of(sdp2) || sdp2.is_subset_of(sdp1)
}
