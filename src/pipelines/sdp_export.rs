//! # Phylogeny SDP Export
//!
//! Aggregates a phylogeny interval file back into SDPs: every tree edge
//! whose subtree reaches the minor-count threshold contributes one SDP,
//! and each distinct SDP collects the genomic intervals it was seen in.

use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing::info;

use crate::data::interval::GenomeInterval;
use crate::error::{PhyloscanError, Result};
use crate::io::flatfile::{FlatFileReader, FlatFileWriter};
use crate::phylo::tree::PhylogenyTreeNode;
use crate::scan::sdp::Sdp;

/// Name of the trailing intervals column in the SDP output
pub const GENOMIC_INTERVALS_COLUMN: &str = "genomicIntervals";

/// The phylogeny-to-SDP aggregation pipeline
#[derive(Clone, Debug)]
pub struct SdpExportPipeline {
    min_minor_count: usize,
}

impl SdpExportPipeline {
    /// `min_minor_count` is the smallest minor cardinality an SDP must
    /// have to be kept.
    pub fn new(min_minor_count: usize) -> Self {
        Self { min_minor_count }
    }

    /// Read a four-column phylogeny interval file and write one row per
    /// distinct SDP: a `0`/`1` column per sample (sorted by name) plus a
    /// pipe-separated `chr;start;end` interval list. SDP rows come out in
    /// order of first appearance.
    pub fn run<R: BufRead, W: Write>(
        &self,
        reader: &mut FlatFileReader<R>,
        writer: &mut FlatFileWriter<W>,
    ) -> Result<()> {
        let header = reader
            .read_row()?
            .ok_or_else(|| PhyloscanError::bad_input("the input file is empty"))?;
        if header.len() != 4 {
            return Err(PhyloscanError::bad_input(format!(
                "expected the input to have 4 columns but found {} columns",
                header.len()
            )));
        }

        let mut sample_names: Option<Vec<Arc<str>>> = None;
        let mut sdp_order: Vec<Sdp> = Vec::new();
        let mut sdp_intervals: HashMap<Sdp, Vec<GenomeInterval>> = HashMap::new();

        while let Some(row) = reader.read_row()? {
            if row.len() != 4 {
                return Err(PhyloscanError::bad_input(format!(
                    "expected 4 columns at line {} but found {}",
                    reader.line(),
                    row.len()
                )));
            }
            let interval = GenomeInterval::new(
                Arc::from(row[0].as_str()),
                parse_position(&row[1], reader.line())?,
                parse_position(&row[2], reader.line())?,
            );
            let phylogeny = PhylogenyTreeNode::from_newick(&row[3])?;

            // the first tree fixes the sample set and column order
            let names: &[Arc<str>] = sample_names
                .get_or_insert_with(|| phylogeny.all_samples().into_iter().collect());

            for sdp in phylogeny.sdps(names, self.min_minor_count)? {
                match sdp_intervals.get_mut(&sdp) {
                    Some(intervals) => intervals.push(interval.clone()),
                    None => {
                        sdp_intervals.insert(sdp.clone(), vec![interval.clone()]);
                        sdp_order.push(sdp);
                    }
                }
            }
        }

        let sample_names = sample_names
            .ok_or_else(|| PhyloscanError::bad_input("the input file has no data rows"))?;
        info!(
            samples = sample_names.len(),
            sdps = sdp_order.len(),
            "aggregated phylogeny SDPs"
        );

        let mut header: Vec<String> = sample_names.iter().map(|n| n.to_string()).collect();
        header.push(GENOMIC_INTERVALS_COLUMN.to_string());
        writer.write_row(&header)?;

        let mut row: Vec<String> = Vec::with_capacity(header.len());
        for sdp in &sdp_order {
            row.clear();
            for i in 0..sample_names.len() {
                row.push(if sdp.get(i) { "1" } else { "0" }.to_string());
            }
            let intervals = &sdp_intervals[sdp];
            let joined: Vec<String> = intervals
                .iter()
                .map(|iv| format!("{};{};{}", iv.chr_id, iv.bp_start, iv.bp_end))
                .collect();
            row.push(joined.join("|"));
            writer.write_row(&row)?;
        }
        writer.flush()
    }
}

fn parse_position(value: &str, line: u64) -> Result<i64> {
    value.trim().parse::<i64>().map_err(|_| {
        PhyloscanError::bad_input(format!("invalid bp position \"{value}\" at line {line}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::flatfile::FlatFileFormat;
    use std::io::Cursor;

    fn run_pipeline(input: &str, min_minor_count: usize) -> Result<Vec<Vec<String>>> {
        let mut reader =
            FlatFileReader::new(Cursor::new(input.to_string()), FlatFileFormat::Csv);
        let mut buffer = Vec::new();
        {
            let mut writer = FlatFileWriter::new(&mut buffer, FlatFileFormat::Csv);
            SdpExportPipeline::new(min_minor_count).run(&mut reader, &mut writer)?;
        }
        let text = String::from_utf8(buffer).expect("utf8 output");
        let mut out_reader =
            FlatFileReader::new(Cursor::new(text), FlatFileFormat::Csv);
        let mut rows = Vec::new();
        while let Some(row) = out_reader.read_row()? {
            rows.push(row);
        }
        Ok(rows)
    }

    const INPUT: &str = "\
chrID,bpStartPosition,bpEndPosition,newickPerfectPhylogeny
chr1,100,300,((S4)S3)S1|S2
chr1,400,900,((S4)S3)S1|S2
chr2,10,20,(S1|S2)S3|S4
";

    #[test]
    fn test_distinct_sdps_collect_their_intervals() {
        let rows = run_pipeline(INPUT, 2).unwrap();
        assert_eq!(rows[0], vec!["S1", "S2", "S3", "S4", "genomicIntervals"]);
        assert_eq!(rows.len(), 3);
        // {S3,S4} was seen in two intervals, {S1,S2} in one
        assert_eq!(
            rows[1],
            vec!["0", "0", "1", "1", "chr1;100;300|chr1;400;900"]
        );
        assert_eq!(rows[2], vec!["1", "1", "0", "0", "chr2;10;20"]);
    }

    #[test]
    fn test_minor_count_one_admits_the_singleton_edge_only() {
        let rows = run_pipeline(INPUT, 1).unwrap();
        // exactly the three tree edges: {S4}, {S3,S4} and {S1,S2}; samples
        // attached to internal nodes must not surface as extra SDPs
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1], vec!["0", "0", "0", "1", "chr1;100;300|chr1;400;900"]);
        assert_eq!(
            rows[2],
            vec!["0", "0", "1", "1", "chr1;100;300|chr1;400;900"]
        );
        assert_eq!(rows[3], vec!["1", "1", "0", "0", "chr2;10;20"]);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            run_pipeline("", 1),
            Err(PhyloscanError::BadInputFormat { .. })
        ));
        assert!(matches!(
            run_pipeline("chrID,bpStartPosition,bpEndPosition,newickPerfectPhylogeny\n", 1),
            Err(PhyloscanError::BadInputFormat { .. })
        ));
    }

    #[test]
    fn test_wrong_header_width_is_rejected() {
        assert!(matches!(
            run_pipeline("a,b,c\n", 1),
            Err(PhyloscanError::BadInputFormat { .. })
        ));
    }
}
