//! # Configuration Logic
//!
//! CLI argument parsing and validation using clap derive.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::error::{PhyloscanError, Result};
use crate::io::flatfile::FlatFileFormat;
use crate::io::genotypes::GenotypeColumns;

/// Phyloscan: compatible-interval scanning and perfect phylogenies for
/// biallelic genotype call matrices
#[derive(Parser, Debug)]
#[command(name = "phyloscan")]
#[command(version)]
#[command(about = "Compatible SNP intervals and perfect phylogenies", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a genotype matrix into max-K intervals with one perfect
    /// phylogeny per interval
    MaxKPhylogeny(MaxKPhylogenyArgs),

    /// Aggregate a phylogeny interval file into per-SDP genomic intervals
    PhylogenyToSdp(PhylogenyToSdpArgs),

    /// Sort a genotype matrix by chromosome and bp position
    SortGenotypes(SortGenotypesArgs),
}

/// Flat-file delimiter choice
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Delimiter {
    Csv,
    Tab,
}

impl Delimiter {
    pub fn format(self) -> FlatFileFormat {
        match self {
            Delimiter::Csv => FlatFileFormat::Csv,
            Delimiter::Tab => FlatFileFormat::Tab,
        }
    }
}

/// Column layout of the genotype input files (zero-based indices, -1 for
/// a column that is not present)
#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Column index of the SNP id
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub snp_id_col: i64,

    /// Column index of the A allele
    #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
    pub a_allele_col: i64,

    /// Column index of the B allele
    #[arg(long, default_value_t = 2, allow_hyphen_values = true)]
    pub b_allele_col: i64,

    /// Column index of the chromosome id
    #[arg(long, default_value_t = 3, allow_hyphen_values = true)]
    pub chr_col: i64,

    /// Column index of the bp position
    #[arg(long, default_value_t = 4, allow_hyphen_values = true)]
    pub bp_col: i64,

    /// Genome build identifier recorded with the bp positions
    #[arg(long)]
    pub build_id: Option<String>,

    /// Index of the first genotype column
    #[arg(long, default_value_t = 5)]
    pub first_geno_col: usize,

    /// Exclusive index of the last genotype column (-1 means through the
    /// last column)
    #[arg(long, default_value_t = -1, allow_hyphen_values = true)]
    pub last_geno_col: i64,
}

impl IngestArgs {
    /// Resolve the flags into a column layout
    pub fn columns(&self) -> Result<GenotypeColumns> {
        let optional = |index: i64| -> Option<usize> {
            usize::try_from(index).ok()
        };
        if optional(self.a_allele_col).is_some() != optional(self.b_allele_col).is_some() {
            return Err(PhyloscanError::bad_input(
                "the A and B allele columns must be given together",
            ));
        }
        Ok(GenotypeColumns {
            a_allele: optional(self.a_allele_col),
            b_allele: optional(self.b_allele_col),
            snp_id: optional(self.snp_id_col),
            chromosome: optional(self.chr_col),
            bp_position: optional(self.bp_col),
            build_id: self.build_id.clone(),
            first_genotype: self.first_geno_col,
            last_genotype_exclusive: optional(self.last_geno_col),
        })
    }
}

#[derive(Args, Debug)]
pub struct MaxKPhylogenyArgs {
    /// Input genotype flat file(s); several files concatenate and must
    /// share a header
    #[arg(long = "in", value_name = "FILE", required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Output file with max-K intervals and their phylogenies
    #[arg(long = "out", value_name = "FILE")]
    pub output: PathBuf,

    /// Delimiter for input and output files
    #[arg(long, value_enum, default_value = "csv")]
    pub delimiter: Delimiter,

    #[command(flatten)]
    pub ingest: IngestArgs,

    /// Keep scanning remaining chromosomes when one fails
    #[arg(long)]
    pub continue_on_error: bool,

    /// Worker threads for cross-chromosome scanning (default: sequential)
    #[arg(long)]
    pub threads: Option<usize>,
}

#[derive(Args, Debug)]
pub struct PhylogenyToSdpArgs {
    /// Input phylogeny interval file (chrID, bpStartPosition,
    /// bpEndPosition, newickPerfectPhylogeny)
    #[arg(long = "in", value_name = "FILE")]
    pub input: PathBuf,

    /// Minimum minor allele count an SDP must have to be kept
    #[arg(long)]
    pub minor_count: usize,

    /// Output SDP file
    #[arg(long = "out", value_name = "FILE")]
    pub output: PathBuf,

    /// Delimiter for input and output files
    #[arg(long, value_enum, default_value = "csv")]
    pub delimiter: Delimiter,
}

#[derive(Args, Debug)]
pub struct SortGenotypesArgs {
    /// Input genotype flat file(s)
    #[arg(long = "in", value_name = "FILE", required = true, num_args = 1..)]
    pub input: Vec<PathBuf>,

    /// Output genotype flat file, sorted by (chromosome, bp position)
    #[arg(long = "out", value_name = "FILE")]
    pub output: PathBuf,

    /// Delimiter for input and output files
    #[arg(long, value_enum, default_value = "csv")]
    pub delimiter: Delimiter,

    #[command(flatten)]
    pub ingest: IngestArgs,
}
