//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.

use thiserror::Error;

/// Main error type for phyloscan operations
#[derive(Error, Debug)]
pub enum PhyloscanError {
    /// I/O errors (file missing, permission denied, read/write failures)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A chromosome name that does not follow the accepted grammar
    #[error("\"{name}\" is not a valid chromosome name")]
    InvalidChromosome { name: String },

    /// An operation needed per-SNP chromosome ids but the matrix has none
    #[error("operation requires per-SNP chromosome ids but none are present")]
    MissingChromosomeIds,

    /// A phylogeny window hit an H or N call where only A/B is allowed
    #[error("SNP {snp_index} carries a call that is neither A nor B")]
    NonBiallelicInWindow { snp_index: u64 },

    /// SDP insertion found an overlap that is neither subset nor disjoint
    #[error("cannot build a perfect phylogeny: SDPs are incompatible")]
    IncompatibleSdp,

    /// A phylogeny window produced a root with no child edges
    #[error("phylogeny construction produced a tree with no child edges")]
    EmptyPhylogeny,

    /// Malformed input data (flat files, Newick text, CSV records)
    #[error("bad input format: {message}")]
    BadInputFormat { message: String },

    /// A mutating operation was called on a read-only matrix view
    #[error("mutation is not supported on a matrix view")]
    UnsupportedOnView,

    /// The alchemy call file contained no rows
    #[error("failed to convert: the alchemy file appears to be empty")]
    EmptyAlchemyFile,
}

/// Type alias for Results using PhyloscanError
pub type Result<T> = std::result::Result<T, PhyloscanError>;

impl PhyloscanError {
    /// Create a bad-input error with a message
    pub fn bad_input(message: impl Into<String>) -> Self {
        Self::BadInputFormat {
            message: message.into(),
        }
    }

    /// Create an invalid-chromosome error for a name
    pub fn invalid_chromosome(name: impl Into<String>) -> Self {
        Self::InvalidChromosome { name: name.into() }
    }
}
