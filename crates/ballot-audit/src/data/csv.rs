//! Ballot file parsing.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use ballot_audit_core::{CandidateId, Ranking};

use super::DataError;

const HEADER: &str = "ranking";
const BLANK: &str = "-";

/// Load every ballot in a file, in file order.
///
/// # Errors
/// Returns `DataError` if the file cannot be read or a line is not a
/// comma-separated list of candidate ids.
pub fn load_ballots(path: &Path) -> Result<Vec<Ranking>, DataError> {
    let file = File::open(path)?;
    parse_ballots(BufReader::new(file))
}

/// Parse ballots from any buffered reader.
pub fn parse_ballots<R: BufRead>(reader: R) -> Result<Vec<Ranking>, DataError> {
    let mut ballots = Vec::new();
    let mut seen_content = false;

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let line = line.trim();
        let line_no = line_num + 1;

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Header is only recognised before the first ballot
        if !seen_content && line.eq_ignore_ascii_case(HEADER) {
            seen_content = true;
            continue;
        }
        seen_content = true;

        if line == BLANK {
            ballots.push(Ranking::new(Vec::new()));
            continue;
        }

        let mut preferences = Vec::new();
        for field in line.split(',') {
            let field = field.trim();
            if field.is_empty() {
                return Err(DataError::Parse {
                    line: line_no,
                    message: "empty preference field".to_string(),
                });
            }
            let id: u32 = field.parse().map_err(|_| DataError::InvalidCandidate {
                line: line_no,
                value: field.to_string(),
            })?;
            preferences.push(CandidateId(id));
        }
        ballots.push(Ranking::new(preferences));
    }

    Ok(ballots)
}
