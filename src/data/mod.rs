//! # Data Module
//!
//! In-memory representations of genotype data: call codes, the call
//! matrix capability traits with their in-memory implementation, the
//! read-only views the scans run over, chromosome ordering, and interval
//! types.
//!
//! ## Sub-modules
//! - `calls`: per-cell call codes and the textual decode table
//! - `chromosome`: total order over chromosome names
//! - `interval`: SNP-index and base-pair interval types
//! - `matrix`: `CallMatrix` / `CallMatrixMut` and the in-memory matrix
//! - `views`: subset and reverse adapters over a matrix

pub mod calls;
pub mod chromosome;
pub mod interval;
pub mod matrix;
pub mod views;
