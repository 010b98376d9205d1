//! # Newick Serialization
//!
//! Emits and parses the Newick text form of phylogeny trees. Child edges
//! go inside the parentheses; a node's own directly attached samples are
//! the node label after the closing parenthesis, joined with `|` when
//! there are several: `(child_1,...,child_n)sample_1|...|sample_m`. A
//! childless node is just its label. Keeping own samples out of the
//! child list is what lets a parse recover the original structure
//! instead of inventing leaf edges. Branch lengths are optional on
//! output and tolerated on input.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::{PhyloscanError, Result};
use crate::phylo::tree::{PhylogenyTreeEdge, PhylogenyTreeNode};

/// Separator between samples sharing one node label
const SAMPLE_SEPARATOR: char = '|';

/// Serialize a tree to Newick text, terminated with `;`
pub fn write_newick(root: &PhylogenyTreeNode, with_branch_lengths: bool) -> String {
    let mut out = String::new();
    write_node(root, with_branch_lengths, &mut out);
    out.push(';');
    out
}

fn write_node(node: &PhylogenyTreeNode, with_branch_lengths: bool, out: &mut String) {
    if !node.child_edges().is_empty() {
        out.push('(');
        for (i, edge) in node.child_edges().iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            write_node(edge.node(), with_branch_lengths, out);
            if with_branch_lengths {
                let _ = write!(out, ":{}", edge.edge_length());
            }
        }
        out.push(')');
    }
    for (i, sample) in node.samples().iter().enumerate() {
        if i > 0 {
            out.push(SAMPLE_SEPARATOR);
        }
        out.push_str(sample);
    }
}

/// Parse a tree from Newick text.
///
/// Accepts balanced parentheses with comma-separated children, optional
/// node labels, and optional `:length` suffixes (lengths are read but
/// only kept on edges). A node label parses back into the node's own
/// sample list, split on `|`.
pub fn parse_newick(text: &str) -> Result<PhylogenyTreeNode> {
    let mut parser = Parser {
        input: text.as_bytes(),
        pos: 0,
    };
    parser.skip_whitespace();
    let root = parser.parse_node()?;
    // tolerate a trailing :length on the root, as some emitters add one
    parser.parse_branch_length()?;
    parser.skip_whitespace();
    if parser.consume(b';') {
        parser.skip_whitespace();
    }
    if parser.pos != parser.input.len() {
        return Err(PhyloscanError::bad_input(format!(
            "unexpected trailing newick text at byte {}",
            parser.pos
        )));
    }
    Ok(root)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn parse_node(&mut self) -> Result<PhylogenyTreeNode> {
        self.skip_whitespace();
        if self.consume(b'(') {
            let mut child_edges = Vec::new();
            loop {
                let child = self.parse_node()?;
                let edge_length = self.parse_branch_length()?.unwrap_or(1.0);
                child_edges.push(PhylogenyTreeEdge::new(child, edge_length));
                self.skip_whitespace();
                if self.consume(b',') {
                    continue;
                }
                if self.consume(b')') {
                    break;
                }
                return Err(PhyloscanError::bad_input(format!(
                    "expected ',' or ')' at byte {} of newick text",
                    self.pos
                )));
            }
            let samples = self.parse_samples();
            Ok(PhylogenyTreeNode::new(child_edges, samples))
        } else {
            let samples = self.parse_samples();
            if samples.is_empty() {
                return Err(PhyloscanError::bad_input(format!(
                    "expected a node at byte {} of newick text",
                    self.pos
                )));
            }
            Ok(PhylogenyTreeNode::new(Vec::new(), samples))
        }
    }

    /// A node label split into its sample list; empty when no label is
    /// present
    fn parse_samples(&mut self) -> Vec<Arc<str>> {
        match self.parse_label() {
            Some(label) => label
                .split(SAMPLE_SEPARATOR)
                .map(str::trim)
                .filter(|sample| !sample.is_empty())
                .map(Arc::from)
                .collect(),
            None => Vec::new(),
        }
    }

    fn parse_label(&mut self) -> Option<String> {
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.input.len()
            && !matches!(self.input[self.pos], b'(' | b')' | b',' | b':' | b';')
        {
            self.pos += 1;
        }
        let label = std::str::from_utf8(&self.input[start..self.pos])
            .ok()?
            .trim();
        if label.is_empty() {
            None
        } else {
            Some(label.to_string())
        }
    }

    fn parse_branch_length(&mut self) -> Result<Option<f64>> {
        self.skip_whitespace();
        if !self.consume(b':') {
            return Ok(None);
        }
        self.skip_whitespace();
        let start = self.pos;
        while self.pos < self.input.len()
            && matches!(self.input[self.pos], b'0'..=b'9' | b'.' | b'-' | b'+' | b'e' | b'E')
        {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or("");
        text.parse::<f64>().map(Some).map_err(|_| {
            PhyloscanError::bad_input(format!("invalid branch length \"{text}\" in newick text"))
        })
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.input.len() && self.input[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn consume(&mut self, expected: u8) -> bool {
        if self.pos < self.input.len() && self.input[self.pos] == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    fn leaf_edge(sample: &str) -> PhylogenyTreeEdge {
        PhylogenyTreeEdge::new(PhylogenyTreeNode::leaf(name(sample)), 1.0)
    }

    /// root{S1,S2} -> inner{S3} -> leaf{S4}
    fn nested_tree() -> PhylogenyTreeNode {
        let inner = PhylogenyTreeNode::new(vec![leaf_edge("S4")], vec![name("S3")]);
        PhylogenyTreeNode::new(
            vec![PhylogenyTreeEdge::new(inner, 1.0)],
            vec![name("S1"), name("S2")],
        )
    }

    #[test]
    fn test_own_samples_emit_as_the_node_label() {
        let root = nested_tree();
        assert_eq!(write_newick(&root, false), "((S4)S3)S1|S2;");
        assert_eq!(write_newick(&root, true), "((S4:1)S3:1)S1|S2;");
    }

    #[test]
    fn test_parse_recovers_own_samples_from_labels() {
        let tree = parse_newick("((S4)S3)S1|S2;").unwrap();
        assert_eq!(tree.child_edges().len(), 1);
        assert_eq!(tree.samples(), &[name("S1"), name("S2")]);
        let inner = tree.child_edges()[0].node();
        assert_eq!(inner.child_edges().len(), 1);
        assert_eq!(inner.samples(), &[name("S3")]);
        let leaf = inner.child_edges()[0].node();
        assert!(leaf.child_edges().is_empty());
        assert_eq!(leaf.samples(), &[name("S4")]);
    }

    #[test]
    fn test_parse_plain_newick_leaves() {
        let tree = parse_newick("((S4,S3),S1,S2);").unwrap();
        assert_eq!(tree.child_edges().len(), 3);
        assert!(tree.samples().is_empty());
        let inner = tree.child_edges()[0].node();
        assert_eq!(inner.child_edges().len(), 2);
        assert_eq!(inner.child_edges()[0].node().samples(), &[name("S4")]);
        assert_eq!(tree.child_edges()[1].node().samples(), &[name("S1")]);
    }

    #[test]
    fn test_parse_tolerates_lengths_and_labels() {
        let tree = parse_newick("(A:0.5,(B:1,C:2)inner:3.5)root;").unwrap();
        assert_eq!(tree.samples(), &[name("root")]);
        assert_eq!(tree.child_edges()[0].edge_length(), 0.5);
        let inner = tree.child_edges()[1].node();
        assert_eq!(inner.samples(), &[name("inner")]);
        assert_eq!(tree.child_edges()[1].edge_length(), 3.5);
    }

    #[test]
    fn test_round_trip_is_structural() {
        // own samples on internal nodes survive a round trip as own
        // samples, not as extra leaf children
        let root = nested_tree();
        let reparsed = parse_newick(&root.to_newick()).unwrap();
        assert_eq!(reparsed, root);

        // a childless node holding several samples round-trips too
        let star = PhylogenyTreeNode::new(
            vec![
                PhylogenyTreeEdge::new(
                    PhylogenyTreeNode::new(Vec::new(), vec![name("S3"), name("S4")]),
                    1.0,
                ),
                leaf_edge("S1"),
            ],
            vec![name("S2")],
        );
        assert_eq!(write_newick(&star, false), "(S3|S4,S1)S2;");
        let reparsed = parse_newick(&star.to_newick()).unwrap();
        assert_eq!(reparsed, star);

        // the edge SDP sets agree as well
        let names: Vec<Arc<str>> = root.all_samples().into_iter().collect();
        assert_eq!(
            reparsed_sdps(&root, &names),
            root.sdps(&names, 1).unwrap()
        );
    }

    fn reparsed_sdps(
        tree: &PhylogenyTreeNode,
        names: &[Arc<str>],
    ) -> Vec<crate::scan::sdp::Sdp> {
        parse_newick(&tree.to_newick())
            .unwrap()
            .sdps(names, 1)
            .unwrap()
    }

    #[test]
    fn test_plain_text_round_trip() {
        // trees whose nodes carry single samples keep their text form
        let text = "(((D,E)C),A,B);";
        let tree = parse_newick(text).unwrap();
        assert_eq!(tree.to_newick(), text);
    }

    #[test]
    fn test_parse_rejects_malformed_text() {
        for text in ["((A,B);", "(A,B", "(A,,B);", "", ";", "(A,B));"] {
            assert!(
                matches!(
                    parse_newick(text),
                    Err(PhyloscanError::BadInputFormat { .. })
                ),
                "{text:?}"
            );
        }
    }
}
