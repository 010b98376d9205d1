//! # I/O Module
//!
//! File reading/writing boundaries. Converts between delimited flat
//! files and the in-memory `GenotypeCallMatrix` representation.

pub mod flatfile;
pub mod genotypes;
