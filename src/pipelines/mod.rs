//! # Pipelines Module
//!
//! High-level workflow orchestration: the max-K phylogeny scan over a
//! call matrix and the phylogeny-to-SDP aggregation.

pub mod maxk_phylogeny;
pub mod sdp_export;

pub use maxk_phylogeny::{
    write_phylogeny_records, CancelToken, MaxKPhylogenyPipeline, PhylogenyRecord,
};
pub use sdp_export::SdpExportPipeline;
