//! # Phyloscan Library
//!
//! Analyzes biallelic genotype call matrices: partitions each chromosome
//! into maximum-coverage compatible SNP intervals under the
//! infinite-sites assumption and builds one perfect phylogeny per
//! interval.
//!
//! ## Modules
//! - `config`: CLI argument parsing and validation
//! - `data`: call codes, the call matrix and its views, chromosome order
//! - `error`: error types and result alias
//! - `io`: flat-file reading/writing for matrices and scan output
//! - `phylo`: inclusion hierarchies, phylogeny trees, Newick
//! - `pipelines`: high-level workflow orchestration
//! - `scan`: SDP compatibility and the interval scans

pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod phylo;
pub mod pipelines;
pub mod scan;

// Re-export commonly used types
pub use data::interval::{GenomeInterval, IndexedSnpInterval};
pub use data::matrix::{copy_call_matrix, CallMatrix, CallMatrixMut, GenotypeCallMatrix};
pub use data::views::{ReverseView, SubsetView};
pub use error::{PhyloscanError, Result};
pub use phylo::builder::infer_perfect_phylogenies;
pub use phylo::tree::{PhylogenyTreeEdge, PhylogenyTreeNode};
pub use pipelines::{CancelToken, MaxKPhylogenyPipeline, SdpExportPipeline};
pub use scan::maxk::max_k_scan;
pub use scan::sdp::Sdp;
