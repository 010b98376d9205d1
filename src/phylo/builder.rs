//! # Perfect Phylogeny Construction
//!
//! Builds a rooted phylogeny for each SNP interval by inserting the
//! minority-normalized SDP of every row into an inclusion hierarchy and
//! materializing the hierarchy as a tree whose nodes carry the samples
//! not claimed by any child.

use std::sync::Arc;

use crate::data::interval::IndexedSnpInterval;
use crate::data::matrix::CallMatrix;
use crate::error::{PhyloscanError, Result};
use crate::phylo::hierarchy::{insert_sdp, HierarchyNode};
use crate::phylo::tree::{PhylogenyTreeEdge, PhylogenyTreeNode};
use crate::scan::sdp::Sdp;

/// Infer one perfect phylogeny per interval.
///
/// Every SNP row inside an interval must carry only A/B calls; the whole
/// window fails with `NonBiallelicInWindow` otherwise. The intervals must
/// be the output of a compatible-interval scan over the same matrix, so
/// SDP insertion conflicts surface as `IncompatibleSdp`.
pub fn infer_perfect_phylogenies<M: CallMatrix>(
    matrix: &M,
    intervals: &[IndexedSnpInterval],
) -> Result<Vec<PhylogenyTreeNode>> {
    let sample_ids = matrix.sample_ids().ok_or_else(|| {
        PhyloscanError::bad_input("sample ids are required to build phylogenies")
    })?;

    let mut phylogenies = Vec::with_capacity(intervals.len());
    for interval in intervals {
        let mut hierarchy: Vec<HierarchyNode> = Vec::new();
        for snp_index in interval.range() {
            let calls = matrix.snp_calls(snp_index as u64);
            let sdp = Sdp::minority_normalized_from_calls(calls).map_err(|_| {
                PhyloscanError::NonBiallelicInWindow {
                    snp_index: snp_index as u64,
                }
            })?;
            insert_sdp(&mut hierarchy, &sdp)?;
        }

        let root = HierarchyNode::with_children(Sdp::all_ones(sample_ids.len()), hierarchy);
        let phylogeny = hierarchy_to_phylogeny(&root, sample_ids);
        if phylogeny.child_edges().is_empty() {
            return Err(PhyloscanError::EmptyPhylogeny);
        }
        phylogenies.push(phylogeny);
    }

    Ok(phylogenies)
}

fn hierarchy_to_phylogeny(node: &HierarchyNode, sample_ids: &[Arc<str>]) -> PhylogenyTreeNode {
    let mut child_edges = Vec::with_capacity(node.children().len());
    let mut combined_child_sdps = Sdp::zeros(sample_ids.len());
    for child in node.children() {
        combined_child_sdps.union_with(child.sdp());
        let child_phylogeny = hierarchy_to_phylogeny(child, sample_ids);
        child_edges.push(PhylogenyTreeEdge::new(child_phylogeny, 1.0));
    }

    let samples = sample_ids
        .iter()
        .enumerate()
        .filter(|&(i, _)| node.sdp().get(i) && !combined_child_sdps.get(i))
        .map(|(_, sample)| Arc::clone(sample))
        .collect();

    PhylogenyTreeNode::new(child_edges, samples)
}
