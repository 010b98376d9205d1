//! # SDP Inclusion Hierarchy
//!
//! The intermediate structure the phylogeny builder grows: a forest of
//! nodes whose SDPs nest strictly. Siblings are pairwise disjoint and
//! every child is a proper subset of its parent.

use crate::error::{PhyloscanError, Result};
use crate::scan::sdp::Sdp;

/// One node of the inclusion hierarchy
#[derive(Clone, Debug)]
pub struct HierarchyNode {
    sdp: Sdp,
    children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    /// A leaf hierarchy node for one SDP
    pub fn new(sdp: Sdp) -> Self {
        Self {
            sdp,
            children: Vec::new(),
        }
    }

    /// A node with an initial child list
    pub fn with_children(sdp: Sdp, children: Vec<HierarchyNode>) -> Self {
        Self { sdp, children }
    }

    pub fn sdp(&self) -> &Sdp {
        &self.sdp
    }

    pub fn children(&self) -> &[HierarchyNode] {
        &self.children
    }
}

/// Insert a minority-normalized SDP into a hierarchy list.
///
/// Empty SDPs are silently skipped. Fails with `IncompatibleSdp` when the
/// SDP overlaps an existing one without a subset relation in either
/// direction, which means no perfect phylogeny exists for the window.
pub fn insert_sdp(hierarchy: &mut Vec<HierarchyNode>, sdp: &Sdp) -> Result<()> {
    if sdp.is_empty() {
        return Ok(());
    }
    insert_recursive(hierarchy, sdp)
}

fn insert_recursive(siblings: &mut Vec<HierarchyNode>, sdp: &Sdp) -> Result<()> {
    for i in 0..siblings.len() {
        if !siblings[i].sdp.intersects(sdp) {
            continue;
        }
        if siblings[i].sdp == *sdp {
            // already accounted for
            return Ok(());
        }
        if sdp.is_subset_of(&siblings[i].sdp) {
            return insert_recursive(&mut siblings[i].children, sdp);
        }
        if siblings[i].sdp.is_subset_of(sdp) {
            // the current node becomes the first child of a new node for
            // this SDP; later siblings inside the SDP move under it too
            let displaced = std::mem::replace(&mut siblings[i], HierarchyNode::new(sdp.clone()));
            siblings[i].children.push(displaced);
            let mut j = siblings.len();
            while j > i + 1 {
                j -= 1;
                if siblings[j].sdp.intersects(sdp) {
                    if !siblings[j].sdp.is_subset_of(sdp) {
                        return Err(PhyloscanError::IncompatibleSdp);
                    }
                    let sibling = siblings.remove(j);
                    siblings[i].children.push(sibling);
                }
            }
            return Ok(());
        }
        return Err(PhyloscanError::IncompatibleSdp);
    }

    siblings.push(HierarchyNode::new(sdp.clone()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bits(pattern: &str) -> Sdp {
        let mut sdp = Sdp::zeros(pattern.len());
        for (i, c) in pattern.chars().enumerate() {
            sdp.set(i, c == '1');
        }
        sdp
    }

    fn insert_all(patterns: &[&str]) -> Result<Vec<HierarchyNode>> {
        let mut hierarchy = Vec::new();
        for pattern in patterns {
            insert_sdp(&mut hierarchy, &bits(pattern))?;
        }
        Ok(hierarchy)
    }

    #[test]
    fn test_disjoint_sdps_become_siblings() {
        let hierarchy = insert_all(&["1100", "0010"]).unwrap();
        assert_eq!(hierarchy.len(), 2);
        assert!(hierarchy.iter().all(|n| n.children().is_empty()));
    }

    #[test]
    fn test_subset_nests_under_superset() {
        let hierarchy = insert_all(&["1110", "0110", "0100"]).unwrap();
        assert_eq!(hierarchy.len(), 1);
        assert_eq!(hierarchy[0].sdp(), &bits("1110"));
        assert_eq!(hierarchy[0].children().len(), 1);
        assert_eq!(hierarchy[0].children()[0].sdp(), &bits("0110"));
        assert_eq!(hierarchy[0].children()[0].children()[0].sdp(), &bits("0100"));
    }

    #[test]
    fn test_superset_displaces_and_collects_siblings() {
        let hierarchy = insert_all(&["1000", "0100", "0010", "1110"]).unwrap();
        assert_eq!(hierarchy.len(), 1);
        let top = &hierarchy[0];
        assert_eq!(top.sdp(), &bits("1110"));
        let child_sdps: Vec<&Sdp> = top.children().iter().map(HierarchyNode::sdp).collect();
        assert_eq!(
            child_sdps,
            vec![&bits("1000"), &bits("0010"), &bits("0100")]
        );
    }

    #[test]
    fn test_duplicates_are_ignored() {
        let hierarchy = insert_all(&["1100", "1100", "1100"]).unwrap();
        assert_eq!(hierarchy.len(), 1);
        assert!(hierarchy[0].children().is_empty());
    }

    #[test]
    fn test_empty_sdp_is_skipped() {
        let hierarchy = insert_all(&["0000", "1100"]).unwrap();
        assert_eq!(hierarchy.len(), 1);
    }

    #[test]
    fn test_partial_overlap_is_incompatible() {
        assert!(matches!(
            insert_all(&["1100", "0110"]),
            Err(PhyloscanError::IncompatibleSdp)
        ));
        // the same conflict through the sibling-collection path
        assert!(matches!(
            insert_all(&["1000", "0011", "1110"]),
            Err(PhyloscanError::IncompatibleSdp)
        ));
    }
}
