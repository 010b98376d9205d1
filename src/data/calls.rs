//! # Call Codes
//!
//! Per-cell byte encoding of genotype calls and the textual decode table
//! used by the flat-file ingest layer.

/// Call code for the A allele
pub const A_CALL: u8 = 1;
/// Call code for the B allele
pub const B_CALL: u8 = 2;
/// Call code for a heterozygous call
pub const H_CALL: u8 = 3;
/// Call code for a missing call (the byte value of -1)
pub const N_CALL: u8 = 0xFF;

/// Check whether a call is a concrete A or B allele
#[inline]
pub fn is_ab(call: u8) -> bool {
    call == A_CALL || call == B_CALL
}

/// Render a call code the way flat files spell it (`1`, `2`, `3`, `-1`)
pub fn call_to_text(call: u8) -> String {
    (call as i8).to_string()
}

/// Decode one textual genotype call.
///
/// Decode order: missing-call literals first, then heterozygous literals,
/// then a match against the SNP's A/B alleles, then the decimal spellings
/// of the call codes. Anything else decodes to N.
pub fn decode_call(a_allele: Option<char>, b_allele: Option<char>, token: &str) -> u8 {
    let token = token.trim();
    if token.is_empty()
        || token.eq_ignore_ascii_case("NA")
        || token.eq_ignore_ascii_case("N")
        || token.eq_ignore_ascii_case("NN")
        || token == "-"
    {
        return N_CALL;
    }
    if token.eq_ignore_ascii_case("H") || token.eq_ignore_ascii_case("HH") {
        return H_CALL;
    }
    if token.len() == 1 {
        let c = token.chars().next().unwrap_or_default();
        if let Some(a) = a_allele {
            if c.eq_ignore_ascii_case(&a) {
                return A_CALL;
            }
        }
        if let Some(b) = b_allele {
            if c.eq_ignore_ascii_case(&b) {
                return B_CALL;
            }
        }
    }
    match token.parse::<i8>() {
        Ok(1) => A_CALL,
        Ok(2) => B_CALL,
        Ok(3) => H_CALL,
        Ok(-1) => N_CALL,
        _ => N_CALL,
    }
}

/// Decode a full SNP row of textual calls.
///
/// When the A/B alleles are unknown and exactly two distinct nucleotide
/// codes appear among the tokens, those two are adopted as A and B in
/// order of first appearance. Nucleotide tokens that cannot be resolved
/// this way decode to N.
pub fn decode_calls<S: AsRef<str>>(
    a_allele: Option<char>,
    b_allele: Option<char>,
    tokens: &[S],
) -> Vec<u8> {
    let (a_allele, b_allele) = if a_allele.is_some() && b_allele.is_some() {
        (a_allele, b_allele)
    } else {
        adopt_alleles(tokens)
    };
    tokens
        .iter()
        .map(|t| decode_call(a_allele, b_allele, t.as_ref()))
        .collect()
}

/// Pick A/B alleles from the two nucleotide codes observed in a row, in
/// order of first appearance. Returns `(None, None)` unless exactly two
/// distinct codes from {A, C, G, T} appear.
fn adopt_alleles<S: AsRef<str>>(tokens: &[S]) -> (Option<char>, Option<char>) {
    let mut seen: Vec<char> = Vec::new();
    for token in tokens {
        let token = token.as_ref().trim();
        if token.len() != 1 {
            continue;
        }
        let c = token.chars().next().unwrap_or_default().to_ascii_uppercase();
        if matches!(c, 'A' | 'C' | 'G' | 'T') && !seen.contains(&c) {
            seen.push(c);
        }
    }
    match seen.as_slice() {
        [a, b] => (Some(*a), Some(*b)),
        _ => (None, None),
    }
}
