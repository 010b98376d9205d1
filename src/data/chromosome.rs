//! # Chromosome Ordering
//!
//! Total order over chromosome names: numbered chromosomes sort by their
//! numeric value, followed by X, Y and M in that order. Names may carry a
//! case-insensitive `chr` or `chromosome` prefix.

use std::cmp::Ordering;

use crate::error::{PhyloscanError, Result};

/// Sort rank of a chromosome name
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChromosomeRank {
    /// A numbered chromosome, ordered by value
    Numbered(u64),
    X,
    Y,
    M,
}

/// Parse a chromosome name into its sort rank.
///
/// The accepted grammar is `(?i)^(chromosome|chr)?\s*(\S+)$` where the
/// captured token is either a number or one of X, Y, M.
pub fn parse_chromosome(name: &str) -> Result<ChromosomeRank> {
    let token = strip_prefix(name).trim_start();
    if token.is_empty() || token.chars().any(char::is_whitespace) {
        return Err(PhyloscanError::invalid_chromosome(name));
    }
    if let Ok(number) = token.parse::<u64>() {
        return Ok(ChromosomeRank::Numbered(number));
    }
    match token.to_ascii_uppercase().as_str() {
        "X" => Ok(ChromosomeRank::X),
        "Y" => Ok(ChromosomeRank::Y),
        "M" => Ok(ChromosomeRank::M),
        _ => Err(PhyloscanError::invalid_chromosome(name)),
    }
}

/// Compare two chromosome names under the chromosome ordering
pub fn compare_chromosomes(name1: &str, name2: &str) -> Result<Ordering> {
    Ok(parse_chromosome(name1)?.cmp(&parse_chromosome(name2)?))
}

fn strip_prefix(name: &str) -> &str {
    for prefix in ["chromosome", "chr"] {
        let len = prefix.len();
        if name.len() >= len && name.as_bytes()[..len].eq_ignore_ascii_case(prefix.as_bytes()) {
            // a matched prefix is pure ASCII, so the split is safe
            return &name[len..];
        }
    }
    name
}
