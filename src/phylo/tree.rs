//! # Phylogeny Trees
//!
//! Rooted trees over the samples. Internal nodes may carry samples of
//! their own (those in the node's SDP but in none of its children); every
//! edge points at a child node and carries a length.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{PhyloscanError, Result};
use crate::phylo::newick;
use crate::scan::sdp::Sdp;

/// An edge of a perfect phylogeny tree
#[derive(Clone, Debug, PartialEq)]
pub struct PhylogenyTreeEdge {
    node: PhylogenyTreeNode,
    edge_length: f64,
}

impl PhylogenyTreeEdge {
    pub fn new(node: PhylogenyTreeNode, edge_length: f64) -> Self {
        Self { node, edge_length }
    }

    /// The child node at the end of this edge
    pub fn node(&self) -> &PhylogenyTreeNode {
        &self.node
    }

    /// Edge length; no units are implied at this level
    pub fn edge_length(&self) -> f64 {
        self.edge_length
    }
}

/// A node of a perfect phylogeny tree
#[derive(Clone, Debug, PartialEq, Default)]
pub struct PhylogenyTreeNode {
    child_edges: Vec<PhylogenyTreeEdge>,
    samples: Vec<Arc<str>>,
}

impl PhylogenyTreeNode {
    pub fn new(child_edges: Vec<PhylogenyTreeEdge>, samples: Vec<Arc<str>>) -> Self {
        Self {
            child_edges,
            samples,
        }
    }

    /// A leaf node holding a single sample
    pub fn leaf(sample: Arc<str>) -> Self {
        Self {
            child_edges: Vec::new(),
            samples: vec![sample],
        }
    }

    pub fn child_edges(&self) -> &[PhylogenyTreeEdge] {
        &self.child_edges
    }

    /// Samples attached directly to this node
    pub fn samples(&self) -> &[Arc<str>] {
        &self.samples
    }

    /// Every sample in the tree, sorted by name
    pub fn all_samples(&self) -> BTreeSet<Arc<str>> {
        let mut samples = BTreeSet::new();
        self.collect_samples(&mut samples);
        samples
    }

    fn collect_samples(&self, out: &mut BTreeSet<Arc<str>>) {
        for sample in &self.samples {
            out.insert(Arc::clone(sample));
        }
        for edge in &self.child_edges {
            edge.node.collect_samples(out);
        }
    }

    /// Serialize this tree to Newick text, edge lengths omitted
    pub fn to_newick(&self) -> String {
        newick::write_newick(self, false)
    }

    /// Parse a tree from Newick text
    pub fn from_newick(text: &str) -> Result<Self> {
        newick::parse_newick(text)
    }

    /// Extract the distinct SDP bitsets defined by the tree's edges.
    ///
    /// `sample_names` must be sorted; each edge contributes the bitset of
    /// sample names in the subtree below it, and only bitsets whose minor
    /// cardinality reaches `min_minor_count` are kept. Bitsets come out in
    /// edge traversal order.
    pub fn sdps(&self, sample_names: &[Arc<str>], min_minor_count: usize) -> Result<Vec<Sdp>> {
        let mut out = Vec::new();
        self.subtree_sdp(sample_names, min_minor_count, &mut out)?;
        Ok(out)
    }

    fn subtree_sdp(
        &self,
        sample_names: &[Arc<str>],
        min_minor_count: usize,
        out: &mut Vec<Sdp>,
    ) -> Result<Sdp> {
        let mut bits = Sdp::zeros(sample_names.len());
        for sample in &self.samples {
            let index = sample_names.binary_search(sample).map_err(|_| {
                PhyloscanError::bad_input(format!(
                    "sample \"{sample}\" does not appear in the sample name list"
                ))
            })?;
            bits.set(index, true);
        }
        for edge in &self.child_edges {
            let child_bits = edge.node.subtree_sdp(sample_names, min_minor_count, out)?;
            let ones = child_bits.count_ones();
            let minor_count = ones.min(sample_names.len() - ones);
            if minor_count >= min_minor_count && !out.contains(&child_bits) {
                out.push(child_bits.clone());
            }
            bits.union_with(&child_bits);
        }
        Ok(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    /// ((S4)S3)S1|S2 with samples on internal nodes
    fn nested_tree() -> PhylogenyTreeNode {
        let s4 = PhylogenyTreeNode::leaf(name("S4"));
        let inner = PhylogenyTreeNode::new(
            vec![PhylogenyTreeEdge::new(s4, 1.0)],
            vec![name("S3")],
        );
        PhylogenyTreeNode::new(
            vec![PhylogenyTreeEdge::new(inner, 1.0)],
            vec![name("S1"), name("S2")],
        )
    }

    #[test]
    fn test_all_samples_is_sorted_and_complete() {
        let tree = nested_tree();
        let samples: Vec<Arc<str>> = tree.all_samples().into_iter().collect();
        assert_eq!(samples, vec![name("S1"), name("S2"), name("S3"), name("S4")]);
    }

    #[test]
    fn test_sdps_respect_minor_count_threshold() {
        let tree = nested_tree();
        let names: Vec<Arc<str>> = tree.all_samples().into_iter().collect();

        let sdps = tree.sdps(&names, 2).unwrap();
        assert_eq!(sdps.len(), 1);
        assert!(sdps[0].get(2) && sdps[0].get(3));
        assert_eq!(sdps[0].count_ones(), 2);

        let sdps = tree.sdps(&names, 1).unwrap();
        // the {S4} edge and the {S3,S4} edge
        assert_eq!(sdps.len(), 2);
    }

    #[test]
    fn test_sdps_reject_unknown_sample() {
        let tree = nested_tree();
        let names = vec![name("S1"), name("S2"), name("S3")];
        assert!(matches!(
            tree.sdps(&names, 1),
            Err(PhyloscanError::BadInputFormat { .. })
        ));
    }
}
