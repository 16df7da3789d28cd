//! Tolerant reader for delimited pose tables.
//!
//! Layout: one header line (skipped), then one line per sample of the form
//! `index,time,{qx,qy,qz,qw,px,py,pz} x joints`. Malformed lines are reported
//! as [`LineDiagnostic`] values and skipped; they never abort the load unless
//! [`NumericPolicy::Abort`] is selected.

use std::{fmt, str::FromStr};

use nalgebra::{Quaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::{
    joints::{LEADING_COLUMNS, VALUES_PER_JOINT},
    JointTable, PosePlayerError, PoseRecord, Result,
};

/// Field separator of the table format.
pub const DELIMITER: char = ',';

const TIME_COLUMN: usize = 1;

/// What to do when a joint value cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericPolicy {
    /// Skip the offending line and record an [`DiagnosticKind::InvalidValue`].
    #[default]
    SkipLine,
    /// Fail the whole load with [`PosePlayerError::UnparsableNumeric`].
    Abort,
}

/// Problem found on a single line of the table.
///
/// Columns are 1-based field positions within the line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DiagnosticKind {
    /// Fewer fields than the joint table requires. The line is skipped.
    InsufficientColumns { found: usize, expected: usize },
    /// The time field is not a finite decimal number. The line is skipped.
    InvalidTime,
    /// A joint value is not a finite decimal number. The line is skipped.
    InvalidValue { column: usize },
    /// The header width differs from the joint table layout.
    HeaderWidthMismatch { found: usize, expected: usize },
    /// The sample time is earlier than the previous retained sample.
    TimeRegression { previous: f64 },
}

impl DiagnosticKind {
    /// Whether the line carrying this diagnostic was dropped.
    pub fn skips_line(&self) -> bool {
        matches!(
            self,
            Self::InsufficientColumns { .. } | Self::InvalidTime | Self::InvalidValue { .. }
        )
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientColumns { found, expected } => {
                write!(f, "insufficient columns ({found} of {expected})")
            }
            Self::InvalidTime => f.write_str("invalid time value"),
            Self::InvalidValue { column } => write!(f, "invalid numeric value in column {column}"),
            Self::HeaderWidthMismatch { found, expected } => {
                write!(f, "header has {found} columns, joint table expects {expected}")
            }
            Self::TimeRegression { previous } => {
                write!(f, "time goes backwards (previous sample at {previous})")
            }
        }
    }
}

/// Diagnostic tied to a 1-based physical line of the source text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineDiagnostic {
    pub line_number: usize,
    pub kind: DiagnosticKind,
}

impl fmt::Display for LineDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line_number, self.kind)
    }
}

/// Records retained from a table, in input order, plus everything noticed
/// along the way.
#[derive(Debug, Clone, Default)]
pub struct ParsedTable {
    pub records: Vec<PoseRecord>,
    pub diagnostics: Vec<LineDiagnostic>,
}

impl ParsedTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn skipped_lines(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| diagnostic.kind.skips_line())
            .count()
    }
}

/// Converts table text into [`PoseRecord`]s laid out by a [`JointTable`].
#[derive(Debug, Clone)]
pub struct TableParser<'a> {
    table: &'a JointTable,
    policy: NumericPolicy,
}

impl<'a> TableParser<'a> {
    pub fn new(table: &'a JointTable) -> Self {
        Self {
            table,
            policy: NumericPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: NumericPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Parses `text`, preserving line order.
    ///
    /// Only fails under [`NumericPolicy::Abort`]; otherwise every bad line
    /// ends up in [`ParsedTable::diagnostics`].
    pub fn parse(&self, text: &str) -> Result<ParsedTable> {
        let expected = self.table.column_count();
        let mut parsed = ParsedTable::default();
        let mut lines = split_lines(text);

        if let Some((line_number, header)) = lines.next() {
            let found = header.split(DELIMITER).count();
            if found != expected {
                tracing::warn!(line_number, found, expected, "header width does not match joint table");
                parsed.diagnostics.push(LineDiagnostic {
                    line_number,
                    kind: DiagnosticKind::HeaderWidthMismatch { found, expected },
                });
            }
        }

        for (line_number, line) in lines {
            let record = match self.parse_line(line) {
                Ok(record) => record,
                Err(DiagnosticKind::InvalidValue { column }) if self.policy == NumericPolicy::Abort => {
                    return Err(PosePlayerError::UnparsableNumeric {
                        line: line_number,
                        column,
                    });
                }
                Err(kind) => {
                    tracing::warn!(line_number, %kind, "skipping pose table line");
                    parsed.diagnostics.push(LineDiagnostic { line_number, kind });
                    continue;
                }
            };

            if let Some(previous) = parsed.records.last().map(|last| last.time) {
                if record.time < previous {
                    let kind = DiagnosticKind::TimeRegression { previous };
                    tracing::warn!(line_number, %kind, "out of order pose sample");
                    parsed.diagnostics.push(LineDiagnostic { line_number, kind });
                }
            }
            parsed.records.push(record);
        }

        tracing::debug!(
            table = %self.table.name,
            version = self.table.version,
            records = parsed.records.len(),
            skipped = parsed.skipped_lines(),
            "parsed pose table"
        );
        Ok(parsed)
    }

    fn parse_line(&self, line: &str) -> std::result::Result<PoseRecord, DiagnosticKind> {
        let tokens: Vec<&str> = line.split(DELIMITER).collect();
        let expected = self.table.column_count();
        if tokens.len() < expected {
            return Err(DiagnosticKind::InsufficientColumns {
                found: tokens.len(),
                expected,
            });
        }

        let time: f64 = parse_finite(tokens[TIME_COLUMN]).ok_or(DiagnosticKind::InvalidTime)?;

        let joint_count = self.table.len();
        let mut rotations = Vec::with_capacity(joint_count);
        let mut positions = Vec::with_capacity(joint_count);
        for joint in 0..joint_count {
            let base = LEADING_COLUMNS + joint * VALUES_PER_JOINT;
            let mut values = [0.0_f32; VALUES_PER_JOINT];
            for (offset, value) in values.iter_mut().enumerate() {
                let column = base + offset;
                *value = parse_finite(tokens[column])
                    .ok_or(DiagnosticKind::InvalidValue { column: column + 1 })?;
            }
            let [qx, qy, qz, qw, px, py, pz] = values;
            rotations.push(Quaternion::new(qw, qx, qy, qz));
            positions.push(Vector3::new(px, py, pz));
        }

        Ok(PoseRecord::new(time, rotations, positions))
    }
}

/// Yields non-blank lines with their 1-based line number. `\n` and `\r\n`
/// advance the count; a lone `\r` splits without advancing it.
fn split_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.split('\n')
        .enumerate()
        .flat_map(|(index, line)| line.split('\r').map(move |piece| (index + 1, piece)))
        .filter(|(_, piece)| !piece.trim().is_empty())
}

fn parse_finite<T>(token: &str) -> Option<T>
where
    T: FromStr + Into<f64> + Copy,
{
    token
        .trim()
        .parse::<T>()
        .ok()
        .filter(|value| Into::<f64>::into(*value).is_finite())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::JointId;

    fn two_joint_table() -> JointTable {
        JointTable::new("test", 1, vec![JointId::Hips, JointId::Head])
    }

    fn row(index: usize, time: &str) -> String {
        format!("{index},{time},0,0,0,1,1,2,3,0.5,0.5,0.5,0.5,4,5,6")
    }

    fn header() -> String {
        let mut columns = vec!["frame".to_string(), "time".to_string()];
        for joint in ["hips", "head"] {
            for value in ["qx", "qy", "qz", "qw", "px", "py", "pz"] {
                columns.push(format!("{joint}_{value}"));
            }
        }
        columns.join(",")
    }

    #[test]
    fn parses_rotations_and_positions_in_table_order() {
        let table = two_joint_table();
        let text = format!("{}\n{}\n", header(), row(0, "0.25"));
        let parsed = TableParser::new(&table).parse(&text).unwrap();

        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.records.len(), 1);
        let record = &parsed.records[0];
        assert_relative_eq!(record.time, 0.25);
        assert_relative_eq!(record.rotations[0], Quaternion::new(1.0, 0.0, 0.0, 0.0));
        assert_relative_eq!(record.positions[0], Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(record.rotations[1], Quaternion::new(0.5, 0.5, 0.5, 0.5));
        assert_relative_eq!(record.positions[1], Vector3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn preserves_line_order_without_sorting() {
        let table = two_joint_table();
        let text = [header(), row(0, "2.0"), row(1, "1.0"), row(2, "3.0")].join("\n");
        let parsed = TableParser::new(&table).parse(&text).unwrap();

        let times: Vec<f64> = parsed.records.iter().map(|record| record.time).collect();
        assert_eq!(times, vec![2.0, 1.0, 3.0]);
        assert_eq!(
            parsed.diagnostics,
            vec![LineDiagnostic {
                line_number: 3,
                kind: DiagnosticKind::TimeRegression { previous: 2.0 },
            }]
        );
        assert_eq!(parsed.skipped_lines(), 0);
    }

    #[test]
    fn skips_short_lines() {
        let table = two_joint_table();
        let text = [header(), "0,1.0,0,0,0,1,0,0,0".to_string(), row(1, "2.0")].join("\n");
        let parsed = TableParser::new(&table).parse(&text).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_relative_eq!(parsed.records[0].time, 2.0);
        assert_eq!(
            parsed.diagnostics[0],
            LineDiagnostic {
                line_number: 2,
                kind: DiagnosticKind::InsufficientColumns {
                    found: 9,
                    expected: 16,
                },
            }
        );
    }

    #[test]
    fn skips_lines_with_unparsable_time() {
        let table = two_joint_table();
        for bad in ["abc", "1.5s", "NaN", "inf", ""] {
            let text = [header(), row(0, bad)].join("\n");
            let parsed = TableParser::new(&table).parse(&text).unwrap();
            assert!(parsed.is_empty(), "time `{bad}` should be rejected");
        }

        let text = [header(), row(0, "x"), row(1, "1e-1")].join("\n");
        let parsed = TableParser::new(&table).parse(&text).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_relative_eq!(parsed.records[0].time, 0.1);
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::InvalidTime);
    }

    #[test]
    fn bad_joint_value_skips_line_by_default() {
        let table = two_joint_table();
        let bad = "0,0.5,0,0,0,1,1,2,3,0.5,0.5,oops,0.5,4,5,6".to_string();
        let text = [header(), bad, row(1, "1.0")].join("\n");
        let parsed = TableParser::new(&table).parse(&text).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(
            parsed.diagnostics,
            vec![LineDiagnostic {
                line_number: 2,
                kind: DiagnosticKind::InvalidValue { column: 12 },
            }]
        );
    }

    #[test]
    fn bad_joint_value_aborts_under_strict_policy() {
        let table = two_joint_table();
        let bad = "0,0.5,0,0,0,1,1,2,3,0.5,0.5,oops,0.5,4,5,6".to_string();
        let text = [header(), row(0, "0.0"), bad].join("\n");
        let err = TableParser::new(&table)
            .with_policy(NumericPolicy::Abort)
            .parse(&text)
            .unwrap_err();

        assert!(matches!(
            err,
            PosePlayerError::UnparsableNumeric { line: 3, column: 12 }
        ));
    }

    #[test]
    fn handles_newline_variants_and_blank_lines() {
        let table = two_joint_table();
        let text = format!(
            "{}\r\n\r\n{}\r\n   \n{}\r{}",
            header(),
            row(0, "0.0"),
            row(1, "1.0"),
            row(2, "2.0")
        );
        let parsed = TableParser::new(&table).parse(&text).unwrap();

        assert_eq!(parsed.records.len(), 3);
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn lone_carriage_return_does_not_advance_line_numbers() {
        let table = two_joint_table();
        let text = format!("{}\n{}\rbroken\n{}\r\n0,bad", header(), row(0, "0.0"), row(1, "1.0"));
        let parsed = TableParser::new(&table).parse(&text).unwrap();

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(
            parsed.diagnostics,
            vec![
                LineDiagnostic {
                    line_number: 2,
                    kind: DiagnosticKind::InsufficientColumns {
                        found: 1,
                        expected: 16,
                    },
                },
                LineDiagnostic {
                    line_number: 4,
                    kind: DiagnosticKind::InsufficientColumns {
                        found: 2,
                        expected: 16,
                    },
                },
            ]
        );
    }

    #[test]
    fn reports_line_numbers_of_the_source_text() {
        let table = two_joint_table();
        let text = format!("{}\n\n{}\n\n\nbroken", header(), row(0, "0.0"));
        let parsed = TableParser::new(&table).parse(&text).unwrap();

        assert_eq!(parsed.diagnostics.len(), 1);
        assert_eq!(parsed.diagnostics[0].line_number, 6);
    }

    #[test]
    fn accepts_extra_columns_and_padded_values() {
        let table = two_joint_table();
        let padded = " 0 , 0.5 ,0,0,0,1,1,2,3,0.5,0.5,0.5,0.5,4,5,6,extra";
        let text = [header(), padded.to_string()].join("\n");
        let parsed = TableParser::new(&table).parse(&text).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_relative_eq!(parsed.records[0].time, 0.5);
    }

    #[test]
    fn flags_header_width_mismatch_without_skipping_data() {
        let table = two_joint_table();
        let text = ["frame,time,hips_qx".to_string(), row(0, "0.0")].join("\n");
        let parsed = TableParser::new(&table).parse(&text).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(
            parsed.diagnostics,
            vec![LineDiagnostic {
                line_number: 1,
                kind: DiagnosticKind::HeaderWidthMismatch {
                    found: 3,
                    expected: 16,
                },
            }]
        );
    }

    #[test]
    fn header_only_yields_no_records() {
        let table = two_joint_table();
        let parsed = TableParser::new(&table).parse(&header()).unwrap();
        assert!(parsed.is_empty());

        let parsed = TableParser::new(&table).parse("").unwrap();
        assert!(parsed.is_empty());
        assert!(parsed.diagnostics.is_empty());
    }
}
