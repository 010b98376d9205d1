//! # Application Entry Point
//!
//! ## Usage
//! ```bash
//! # scan a genotype matrix into max-K intervals and phylogenies
//! phyloscan max-k-phylogeny --in calls.csv --out phylo.csv
//!
//! # aggregate the phylogenies into per-SDP genomic intervals
//! phyloscan phylogeny-to-sdp --in phylo.csv --minor-count 4 --out sdps.csv
//!
//! # sort a genotype matrix by chromosome and position
//! phyloscan sort-genotypes --in calls.csv --out sorted.csv
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use phyloscan::config::{Cli, Command, MaxKPhylogenyArgs, PhylogenyToSdpArgs, SortGenotypesArgs};
use phyloscan::data::matrix::CallMatrix;
use phyloscan::io::flatfile::{FlatFileFormat, FlatFileReader, FlatFileWriter};
use phyloscan::io::genotypes::{read_call_matrix, write_call_matrix};
use phyloscan::pipelines::{MaxKPhylogenyPipeline, SdpExportPipeline};

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::MaxKPhylogeny(args) => run_max_k_phylogeny(args),
        Command::PhylogenyToSdp(args) => run_phylogeny_to_sdp(args),
        Command::SortGenotypes(args) => run_sort_genotypes(args),
    }
}

fn open_readers(
    paths: &[std::path::PathBuf],
    format: FlatFileFormat,
) -> anyhow::Result<Vec<FlatFileReader<BufReader<File>>>> {
    paths
        .iter()
        .map(|path| {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(FlatFileReader::new(BufReader::new(file), format))
        })
        .collect()
}

fn create_writer(
    path: &Path,
    format: FlatFileFormat,
) -> anyhow::Result<FlatFileWriter<BufWriter<File>>> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(FlatFileWriter::new(BufWriter::new(file), format))
}

fn run_max_k_phylogeny(args: MaxKPhylogenyArgs) -> anyhow::Result<()> {
    let threads = args.threads.unwrap_or(1);
    if threads > 1 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    let format = args.delimiter.format();
    let mut readers = open_readers(&args.input, format)?;
    let matrix = read_call_matrix(&mut readers, &args.ingest.columns()?)
        .context("failed to read the genotype matrix")?;
    info!(
        snps = matrix.snp_count(),
        samples = matrix.sample_count(),
        sorted = matrix.sorted_by_position(),
        "loaded genotype matrix"
    );

    let pipeline = MaxKPhylogenyPipeline::new()
        .with_continue_on_error(args.continue_on_error)
        .with_parallel(threads > 1);
    let mut writer = create_writer(&args.output, format)?;
    let records = pipeline
        .run_to_writer(&matrix, &mut writer)
        .context("max-k phylogeny scan failed")?;
    info!(records, output = %args.output.display(), "wrote phylogeny intervals");
    Ok(())
}

fn run_phylogeny_to_sdp(args: PhylogenyToSdpArgs) -> anyhow::Result<()> {
    let format = args.delimiter.format();
    let file = File::open(&args.input)
        .with_context(|| format!("failed to open {}", args.input.display()))?;
    let mut reader = FlatFileReader::new(BufReader::new(file), format);
    let mut writer = create_writer(&args.output, format)?;
    SdpExportPipeline::new(args.minor_count)
        .run(&mut reader, &mut writer)
        .context("phylogeny SDP aggregation failed")?;
    info!(output = %args.output.display(), "wrote SDP table");
    Ok(())
}

fn run_sort_genotypes(args: SortGenotypesArgs) -> anyhow::Result<()> {
    let format = args.delimiter.format();
    let mut readers = open_readers(&args.input, format)?;
    let mut matrix = read_call_matrix(&mut readers, &args.ingest.columns()?)
        .context("failed to read the genotype matrix")?;
    matrix
        .sort_by_position()
        .context("failed to sort the genotype matrix")?;
    let mut writer = create_writer(&args.output, format)?;
    write_call_matrix(&matrix, &mut writer)
        .context("failed to write the sorted genotype matrix")?;
    info!(
        snps = matrix.snp_count(),
        output = %args.output.display(),
        "wrote sorted genotype matrix"
    );
    Ok(())
}
