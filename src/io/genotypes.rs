//! # Genotype Flat Files
//!
//! Reads and writes genotype call matrices as delimited flat files: one
//! header row naming the annotation columns and samples, one row per
//! SNP. Also reads the long-format "alchemy" caller output.

use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing::debug;

use crate::data::calls::{call_to_text, decode_calls, A_CALL, B_CALL, H_CALL};
use crate::data::chromosome::compare_chromosomes;
use crate::data::matrix::{CallMatrix, CallMatrixMut, GenotypeCallMatrix};
use crate::error::{PhyloscanError, Result};
use crate::io::flatfile::{FlatFileReader, FlatFileWriter};

/// Canonical header name of the SNP id column
pub const SNP_ID_COLUMN: &str = "snpID";
/// Canonical header name of the A allele column
pub const A_ALLELE_COLUMN: &str = "aAllele";
/// Canonical header name of the B allele column
pub const B_ALLELE_COLUMN: &str = "bAllele";
/// Canonical header name of the chromosome id column
pub const CHR_ID_COLUMN: &str = "chrID";
/// Canonical header name of the bp position column
pub const BP_POSITION_COLUMN: &str = "bpPosition";

/// Zero-based column layout of a genotype flat file
#[derive(Clone, Debug, Default)]
pub struct GenotypeColumns {
    pub a_allele: Option<usize>,
    pub b_allele: Option<usize>,
    pub snp_id: Option<usize>,
    pub chromosome: Option<usize>,
    pub bp_position: Option<usize>,
    /// Genome build the position column refers to
    pub build_id: Option<String>,
    /// First genotype column
    pub first_genotype: usize,
    /// Exclusive end of the genotype columns; `None` means through the
    /// last column
    pub last_genotype_exclusive: Option<usize>,
}

impl GenotypeColumns {
    /// The layout produced by [`write_call_matrix`]
    pub fn canonical() -> Self {
        Self {
            snp_id: Some(0),
            a_allele: Some(1),
            b_allele: Some(2),
            chromosome: Some(3),
            bp_position: Some(4),
            build_id: None,
            first_genotype: 5,
            last_genotype_exclusive: None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.a_allele.is_some() != self.b_allele.is_some() {
            return Err(PhyloscanError::bad_input(
                "the A and B allele columns must be given together",
            ));
        }
        Ok(())
    }

    fn max_annotation_column(&self) -> Option<usize> {
        [
            self.a_allele,
            self.b_allele,
            self.snp_id,
            self.chromosome,
            self.bp_position,
        ]
        .into_iter()
        .flatten()
        .max()
    }
}

/// Read a call matrix from one or more genotype flat files.
///
/// The first row of the first file is the header; the genotype column
/// headers are the sample ids. Every further file must repeat the header
/// byte for byte. The `sorted_by_position` hint is set iff a chromosome
/// and position column are present and every observed `(chr, bp)` pair is
/// non-decreasing under the chromosome ordering.
pub fn read_call_matrix<R: BufRead>(
    readers: &mut [FlatFileReader<R>],
    columns: &GenotypeColumns,
) -> Result<GenotypeCallMatrix> {
    columns.validate()?;
    if readers.is_empty() {
        return Err(PhyloscanError::bad_input("no genotype input files given"));
    }

    let header = readers[0]
        .read_row()?
        .ok_or_else(|| PhyloscanError::bad_input("failed to read the genotype header"))?;
    let last_genotype = columns.last_genotype_exclusive.unwrap_or(header.len());
    if columns.first_genotype >= last_genotype || last_genotype > header.len() {
        return Err(PhyloscanError::bad_input(format!(
            "genotype columns {}..{} do not fit a {}-column header",
            columns.first_genotype,
            last_genotype,
            header.len()
        )));
    }
    let sample_ids: Vec<Arc<str>> = header[columns.first_genotype..last_genotype]
        .iter()
        .map(|id| Arc::from(id.as_str()))
        .collect();
    let min_row_width = last_genotype.max(columns.max_annotation_column().map_or(0, |c| c + 1));

    let mut call_rows: Vec<Vec<u8>> = Vec::new();
    let mut a_alleles: Vec<char> = Vec::new();
    let mut b_alleles: Vec<char> = Vec::new();
    let mut snp_ids: Vec<Arc<str>> = Vec::new();
    let mut chr_ids: Vec<Arc<str>> = Vec::new();
    let mut bp_positions: Vec<i64> = Vec::new();

    // track whether every (chr, bp) pair arrives in sort order
    let mut is_sorted = columns.chromosome.is_some() && columns.bp_position.is_some();
    let mut previous_chr: Option<String> = None;
    let mut previous_position = -1i64;

    for (file_index, reader) in readers.iter_mut().enumerate() {
        if file_index >= 1 {
            let other_header = reader.read_row()?.ok_or_else(|| {
                PhyloscanError::bad_input("failed to read the genotype header")
            })?;
            if other_header != header {
                return Err(PhyloscanError::bad_input(format!(
                    "all file headers must match, but \"{}\" does not match \"{}\"",
                    other_header.join(","),
                    header.join(","),
                )));
            }
        }

        while let Some(row) = reader.read_row()? {
            if row.len() < min_row_width {
                return Err(PhyloscanError::bad_input(format!(
                    "line {} has {} columns but at least {} are required",
                    reader.line(),
                    row.len(),
                    min_row_width
                )));
            }

            let a_allele = match columns.a_allele {
                Some(column) => Some(parse_allele(&row[column], reader.line())?),
                None => None,
            };
            let b_allele = match columns.b_allele {
                Some(column) => Some(parse_allele(&row[column], reader.line())?),
                None => None,
            };
            if let (Some(a), Some(b)) = (a_allele, b_allele) {
                a_alleles.push(a);
                b_alleles.push(b);
            }

            if let Some(column) = columns.snp_id {
                snp_ids.push(Arc::from(row[column].as_str()));
            }

            let current_chr = columns.chromosome.map(|column| row[column].clone());
            if let Some(chr) = &current_chr {
                chr_ids.push(Arc::from(chr.as_str()));
            }

            let mut current_position = -1i64;
            if let Some(column) = columns.bp_position {
                current_position = row[column].parse::<i64>().map_err(|_| {
                    PhyloscanError::bad_input(format!(
                        "invalid bp position \"{}\" at line {}",
                        row[column],
                        reader.line()
                    ))
                })?;
                bp_positions.push(current_position);
            }

            call_rows.push(decode_calls(
                a_allele,
                b_allele,
                &row[columns.first_genotype..last_genotype],
            ));

            if is_sorted {
                is_sorted = match (&previous_chr, &current_chr) {
                    (_, None) => false,
                    (None, Some(_)) => current_position >= 0,
                    (Some(previous), Some(current)) => {
                        match compare_chromosomes(previous, current) {
                            Ok(std::cmp::Ordering::Less) => current_position >= 0,
                            Ok(std::cmp::Ordering::Equal) => {
                                previous_position <= current_position
                            }
                            // a later chromosome, or a name outside the
                            // ordering grammar, counts as unsorted
                            _ => false,
                        }
                    }
                };
            }
            previous_chr = current_chr;
            previous_position = current_position;
        }
    }

    let snp_count = call_rows.len();
    debug!(snps = snp_count, samples = sample_ids.len(), "read genotype flat file");

    let mut matrix = GenotypeCallMatrix::new();
    matrix.set_call_rows(Some(call_rows))?;
    matrix.set_sample_ids(Some(sample_ids))?;
    if columns.a_allele.is_some() {
        matrix.set_a_alleles(Some(a_alleles))?;
        matrix.set_b_alleles(Some(b_alleles))?;
    }
    if columns.snp_id.is_some() {
        matrix.set_snp_ids(Some(snp_ids))?;
    }
    if columns.chromosome.is_some() {
        matrix.set_chr_ids(Some(chr_ids))?;
    }
    if columns.bp_position.is_some() {
        matrix.set_bp_positions(Some(bp_positions), columns.build_id.clone())?;
    }
    matrix.set_sorted_by_position(is_sorted)?;
    Ok(matrix)
}

fn parse_allele(value: &str, line: u64) -> Result<char> {
    value.trim().chars().next().ok_or_else(|| {
        PhyloscanError::bad_input(format!("empty allele value at line {line}"))
    })
}

/// Write a call matrix as a genotype flat file with the canonical column
/// names. Optional arrays the matrix lacks are left out of the output.
pub fn write_call_matrix<W: Write>(
    matrix: &impl CallMatrix,
    writer: &mut FlatFileWriter<W>,
) -> Result<()> {
    let sample_ids = matrix
        .sample_ids()
        .ok_or_else(|| PhyloscanError::bad_input("sample ids are required to write genotypes"))?;
    let snp_ids = matrix.snp_ids();
    let a_alleles = matrix.a_alleles();
    let b_alleles = matrix.b_alleles();
    let chr_ids = matrix.chr_ids();
    let bp_positions = matrix.bp_positions();

    let mut header: Vec<String> = Vec::new();
    if snp_ids.is_some() {
        header.push(SNP_ID_COLUMN.to_string());
    }
    if a_alleles.is_some() && b_alleles.is_some() {
        header.push(A_ALLELE_COLUMN.to_string());
        header.push(B_ALLELE_COLUMN.to_string());
    }
    if chr_ids.is_some() {
        header.push(CHR_ID_COLUMN.to_string());
    }
    if bp_positions.is_some() {
        header.push(BP_POSITION_COLUMN.to_string());
    }
    for sample in sample_ids {
        header.push(sample.to_string());
    }
    writer.write_row(&header)?;

    let mut row: Vec<String> = Vec::with_capacity(header.len());
    for snp_index in 0..matrix.snp_count() {
        row.clear();
        let i = snp_index as usize;
        if let Some(ids) = &snp_ids {
            row.push(ids[i].to_string());
        }
        if let (Some(a), Some(b)) = (&a_alleles, &b_alleles) {
            row.push(a[i].to_string());
            row.push(b[i].to_string());
        }
        if let Some(ids) = &chr_ids {
            row.push(ids[i].to_string());
        }
        if let Some(positions) = &bp_positions {
            row.push(positions[i].to_string());
        }
        for &call in matrix.snp_calls(snp_index) {
            row.push(call_to_text(call));
        }
        writer.write_row(&row)?;
    }
    writer.flush()
}

/// Read the long-format alchemy caller output: one row per (SNP, sample)
/// with columns `snpID, sampleID, call, ...` and calls spelled `AA`, `BB`
/// or `AB`. Rows are grouped by consecutive SNP id; the sample order of
/// the first SNP defines the columns.
pub fn read_alchemy_calls<R: BufRead>(
    reader: &mut FlatFileReader<R>,
) -> Result<GenotypeCallMatrix> {
    const SNP_ID_COL: usize = 0;
    const SAMPLE_ID_COL: usize = 1;
    const AB_CALL_COL: usize = 2;
    const EXPECTED_COL_COUNT: usize = 14;

    let mut sample_ids: Vec<Arc<str>> = Vec::new();
    let mut snp_ids: Vec<Arc<str>> = Vec::new();
    let mut call_rows: Vec<Vec<u8>> = Vec::new();
    let mut current_row: Vec<u8> = Vec::new();
    let mut previous_snp_id: Option<String> = None;

    while let Some(row) = reader.read_row()? {
        if row.len() != EXPECTED_COL_COUNT {
            return Err(PhyloscanError::bad_input(format!(
                "bad column count at line {}: expected {} columns but there were {}",
                reader.line(),
                EXPECTED_COL_COUNT,
                row.len()
            )));
        }

        let snp_id = &row[SNP_ID_COL];
        if previous_snp_id.as_deref() != Some(snp_id.as_str()) {
            if previous_snp_id.is_some() {
                call_rows.push(std::mem::take(&mut current_row));
            }
            snp_ids.push(Arc::from(snp_id.as_str()));
            previous_snp_id = Some(snp_id.clone());
        }

        current_row.push(alchemy_call_to_code(&row[AB_CALL_COL], reader.line())?);
        if call_rows.is_empty() {
            sample_ids.push(Arc::from(row[SAMPLE_ID_COL].as_str()));
        }
    }

    if previous_snp_id.is_none() {
        return Err(PhyloscanError::EmptyAlchemyFile);
    }
    call_rows.push(current_row);

    let mut matrix = GenotypeCallMatrix::new();
    matrix.set_call_rows(Some(call_rows))?;
    matrix.set_sample_ids(Some(sample_ids))?;
    matrix.set_snp_ids(Some(snp_ids))?;
    Ok(matrix)
}

fn alchemy_call_to_code(ab_call: &str, line: u64) -> Result<u8> {
    match ab_call {
        "AA" => Ok(A_CALL),
        "BB" => Ok(B_CALL),
        "AB" => Ok(H_CALL),
        other => Err(PhyloscanError::bad_input(format!(
            "unexpected AB call value \"{other}\" at line {line}"
        ))),
    }
}
