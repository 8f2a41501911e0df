//! Trade instruction file
//!
//! One instruction per line: `symbol,timestamp,amount,stop,take,id`.
//! A positive amount buys, a negative one sells and zero flattens the
//! position. Stop and take are absolute prices, empty or zero when unused.
//! An optional header line is skipped.

use anyhow::Context;
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::data::parse_datetime;

#[derive(Debug, Error, PartialEq)]
pub enum InstructionError {
    #[error("line {line}: expected 6 fields, found {found}")]
    FieldCount { line: u64, found: usize },

    #[error("line {line}: invalid {field} '{value}'")]
    InvalidNumber {
        line: u64,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp { line: u64, value: String },

    #[error("line {line}: empty instruction id")]
    MissingId { line: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub symbol: String,
    pub time: DateTime<Utc>,
    pub amount: f64,
    pub stop: Option<f64>,
    pub take: Option<f64>,
    pub id: String,
}

impl Instruction {
    pub fn from_record(record: &StringRecord, line: u64) -> Result<Self, InstructionError> {
        if record.len() < 6 {
            return Err(InstructionError::FieldCount {
                line,
                found: record.len(),
            });
        }
        let field = |i: usize| record.get(i).unwrap_or_default();

        let time = parse_datetime(field(1)).ok_or_else(|| InstructionError::InvalidTimestamp {
            line,
            value: field(1).to_string(),
        })?;
        let amount = parse_number(field(2), "amount", line)?;
        let stop = parse_price(field(3), "stop", line)?;
        let take = parse_price(field(4), "take", line)?;
        let id = field(5).to_string();
        if id.is_empty() {
            return Err(InstructionError::MissingId { line });
        }

        Ok(Self {
            symbol: field(0).to_string(),
            time,
            amount,
            stop,
            take,
            id,
        })
    }
}

fn parse_number(value: &str, field: &'static str, line: u64) -> Result<f64, InstructionError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| InstructionError::InvalidNumber {
            line,
            field,
            value: value.to_string(),
        })
}

/// Empty or zero means "not set"
fn parse_price(value: &str, field: &'static str, line: u64) -> Result<Option<f64>, InstructionError> {
    if value.is_empty() {
        return Ok(None);
    }
    let price = parse_number(value, field, line)?;
    Ok((price > 0.0).then_some(price))
}

/// Load every valid instruction; malformed rows are logged and skipped.
/// The result is sorted by time.
pub fn load_instructions(path: &Path) -> anyhow::Result<Vec<Instruction>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open instruction file {}", path.display()))?;
    let (instructions, rejected) = parse_instructions(file);
    for e in &rejected {
        warn!(error = %e, "Malformed instruction skipped");
    }
    Ok(instructions)
}

/// Parse instruction rows, returning the good ones sorted by time along
/// with the errors of the rows that were skipped
pub fn parse_instructions<R: Read>(source: R) -> (Vec<Instruction>, Vec<InstructionError>) {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_reader(source);

    let mut instructions = Vec::new();
    let mut rejected = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                warn!(line, error = %e, "Unreadable instruction row skipped");
                continue;
            }
        };
        // Physical line in the file, comment lines included
        let line = record
            .position()
            .map_or(index as u64 + 1, |p| p.line());
        match Instruction::from_record(&record, line) {
            Ok(instruction) => instructions.push(instruction),
            Err(_) if index == 0 && is_header(&record) => {}
            Err(e) => rejected.push(e),
        }
    }

    instructions.sort_by_key(|i| i.time);
    (instructions, rejected)
}

fn is_header(record: &StringRecord) -> bool {
    record
        .get(2)
        .is_some_and(|amount| amount.parse::<f64>().is_err())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_header_skipped_and_rows_parsed() {
        let file = write_file(
            "symbol,timestamp,amount,stop,take,id\n\
             EURUSD,2024-01-01 02:00:00,0.5,1.0950,1.1100,a1\n\
             EURUSD,2024-01-01 01:00:00,-0.2,,,a2\n",
        );
        let instructions = load_instructions(file.path()).unwrap();
        assert_eq!(instructions.len(), 2);
        // Sorted by time
        assert_eq!(instructions[0].id, "a2");
        assert_eq!(instructions[0].stop, None);
        assert_eq!(instructions[1].amount, 0.5);
        assert_eq!(instructions[1].take, Some(1.1100));
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let file = write_file(
            "EURUSD,2024-01-01 01:00:00,abc,0,0,bad-amount\n\
             EURUSD,not-a-date,1,0,0,bad-time\n\
             EURUSD,2024-01-01 01:00:00,1\n\
             EURUSD,2024-01-01 03:00:00,1,0,0,good\n",
        );
        let instructions = load_instructions(file.path()).unwrap();
        assert_eq!(instructions.len(), 1);
        assert_eq!(instructions[0].id, "good");
    }

    #[test]
    fn test_rejected_rows_report_file_lines() {
        let source = "# generated by the desk\n\
                      # second comment\n\
                      EURUSD,2024-01-01 01:00:00,1,0,0,ok\n\
                      EURUSD,2024-01-01 02:00:00,1,bad,0,broken\n";
        let (instructions, rejected) = parse_instructions(source.as_bytes());
        assert_eq!(instructions.len(), 1);
        assert_eq!(
            rejected,
            vec![InstructionError::InvalidNumber {
                line: 4,
                field: "stop",
                value: "bad".to_string()
            }]
        );
    }

    #[test]
    fn test_zero_levels_mean_unset() {
        let record = StringRecord::from(vec!["EURUSD", "2024-01-01T00:00:00Z", "0", "0", "0", "x"]);
        let instruction = Instruction::from_record(&record, 1).unwrap();
        assert_eq!(instruction.stop, None);
        assert_eq!(instruction.take, None);
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let record = StringRecord::from(vec!["EURUSD", "2024-01-01 00:00:00", "1", "x", "0", "id"]);
        assert_eq!(
            Instruction::from_record(&record, 7),
            Err(InstructionError::InvalidNumber {
                line: 7,
                field: "stop",
                value: "x".to_string()
            })
        );
    }
}
