//! Line-oriented input format.
//!
//! ```text
//! H
//! scSpeed ncSpeed
//! <H rows of H integers: distance matrix>
//! <H rows of "standardCount restrictedCount">
//! R
//! <R lines: TYPE requestTick pid hospitalId distance [severity-if-EP]>
//! C
//! <C lines: cancelTick pid>
//! ```
//!
//! Blank lines are ignored anywhere. Parsing only checks the grammar; whether the
//! values describe a runnable network is checked when the run is built.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clock::Tick;
use crate::error::LoadError;
use crate::hospital::{FleetSize, HospitalId, VehicleSpeeds};
use crate::patient::{PatientId, PriorityClass};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRequest {
    pub priority: PriorityClass,
    pub request_tick: Tick,
    pub pid: PatientId,
    pub hospital: HospitalId,
    pub distance: u64,
    /// Only meaningful for emergencies; 0 otherwise.
    pub severity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRequest {
    pub tick: Tick,
    pub pid: PatientId,
}

/// Fully parsed run description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchInput {
    pub speeds: VehicleSpeeds,
    pub distances: Vec<Vec<u64>>,
    pub fleets: Vec<FleetSize>,
    pub requests: Vec<PatientRequest>,
    pub cancellations: Vec<CancellationRequest>,
}

impl DispatchInput {
    pub fn hospital_count(&self) -> usize {
        self.distances.len()
    }
}

struct FieldLines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> FieldLines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
        }
    }

    /// Next non-blank line as (1-based line number, whitespace-separated fields).
    fn next_fields(&mut self, expected: &'static str) -> Result<(usize, Vec<&'a str>), LoadError> {
        for (index, line) in self.inner.by_ref() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if !fields.is_empty() {
                return Ok((index + 1, fields));
            }
        }
        Err(LoadError::UnexpectedEof { expected })
    }

    fn next_exact(
        &mut self,
        expected: &'static str,
        count: usize,
    ) -> Result<(usize, Vec<&'a str>), LoadError> {
        let (line, fields) = self.next_fields(expected)?;
        expect_field_count(line, &fields, count)?;
        Ok((line, fields))
    }

    fn next_count(&mut self, what: &'static str) -> Result<usize, LoadError> {
        let (line, fields) = self.next_exact(what, 1)?;
        parse_field(line, fields[0], what)
    }

    fn ensure_exhausted(&mut self) -> Result<(), LoadError> {
        match self.inner.find(|(_, line)| !line.trim().is_empty()) {
            Some((index, line)) => Err(LoadError::TrailingContent {
                line: index + 1,
                content: line.trim().to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn expect_field_count(line: usize, fields: &[&str], expected: usize) -> Result<(), LoadError> {
    if fields.len() != expected {
        return Err(LoadError::FieldCount {
            line,
            expected,
            found: fields.len(),
        });
    }
    Ok(())
}

fn parse_field<T: FromStr>(line: usize, token: &str, what: &'static str) -> Result<T, LoadError> {
    token.parse().map_err(|_| LoadError::InvalidNumber {
        line,
        token: token.to_string(),
        what,
    })
}

/// Upper bound on rows reserved ahead of reading them; counts come from the file.
const MAX_RESERVED_ROWS: usize = 1024;

fn row_hint(count: usize) -> usize {
    count.min(MAX_RESERVED_ROWS)
}

pub fn parse_input(text: &str) -> Result<DispatchInput, LoadError> {
    let mut lines = FieldLines::new(text);

    let hospital_count = lines.next_count("hospital count")?;

    let (line, fields) = lines.next_exact("vehicle speeds", 2)?;
    let speeds = VehicleSpeeds {
        standard: parse_field(line, fields[0], "standard vehicle speed")?,
        restricted: parse_field(line, fields[1], "restricted vehicle speed")?,
    };

    let mut distances = Vec::with_capacity(row_hint(hospital_count));
    for _ in 0..hospital_count {
        let (line, fields) = lines.next_exact("distance matrix row", hospital_count)?;
        let row = fields
            .iter()
            .map(|token| parse_field(line, token, "distance"))
            .collect::<Result<Vec<u64>, _>>()?;
        distances.push(row);
    }

    let mut fleets = Vec::with_capacity(row_hint(hospital_count));
    for _ in 0..hospital_count {
        let (line, fields) = lines.next_exact("fleet row", 2)?;
        fleets.push(FleetSize {
            standard: parse_field(line, fields[0], "standard vehicle count")?,
            restricted: parse_field(line, fields[1], "restricted vehicle count")?,
        });
    }

    let request_count = lines.next_count("request count")?;
    let mut requests = Vec::with_capacity(row_hint(request_count));
    for _ in 0..request_count {
        let (line, fields) = lines.next_fields("patient request")?;
        requests.push(parse_request(line, &fields)?);
    }

    let cancellation_count = lines.next_count("cancellation count")?;
    let mut cancellations = Vec::with_capacity(row_hint(cancellation_count));
    for _ in 0..cancellation_count {
        let (line, fields) = lines.next_exact("cancellation", 2)?;
        cancellations.push(CancellationRequest {
            tick: parse_field(line, fields[0], "cancellation tick")?,
            pid: PatientId(parse_field(line, fields[1], "patient id")?),
        });
    }

    lines.ensure_exhausted()?;

    Ok(DispatchInput {
        speeds,
        distances,
        fleets,
        requests,
        cancellations,
    })
}

fn parse_request(line: usize, fields: &[&str]) -> Result<PatientRequest, LoadError> {
    let Some(code) = fields.first() else {
        return Err(LoadError::FieldCount {
            line,
            expected: 5,
            found: 0,
        });
    };
    let priority = PriorityClass::from_code(code).ok_or_else(|| LoadError::UnknownPriority {
        line,
        token: code.to_string(),
    })?;
    let expected = if priority == PriorityClass::Emergency { 6 } else { 5 };
    expect_field_count(line, fields, expected)?;

    let severity = if priority == PriorityClass::Emergency {
        parse_field(line, fields[5], "severity")?
    } else {
        0
    };
    Ok(PatientRequest {
        priority,
        request_tick: parse_field(line, fields[1], "request tick")?,
        pid: PatientId(parse_field(line, fields[2], "patient id")?),
        hospital: HospitalId(parse_field(line, fields[3], "hospital id")?),
        distance: parse_field(line, fields[4], "distance")?,
        severity,
    })
}

pub fn load_input(path: impl AsRef<Path>) -> Result<DispatchInput, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_input(&text)
}

/// Renders `input` in the format [parse_input] reads.
pub fn write_input<W: Write>(input: &DispatchInput, mut out: W) -> io::Result<()> {
    writeln!(out, "{}", input.hospital_count())?;
    writeln!(out, "{} {}", input.speeds.standard, input.speeds.restricted)?;
    for row in &input.distances {
        let cells: Vec<String> = row.iter().map(u64::to_string).collect();
        writeln!(out, "{}", cells.join(" "))?;
    }
    for fleet in &input.fleets {
        writeln!(out, "{} {}", fleet.standard, fleet.restricted)?;
    }
    writeln!(out, "{}", input.requests.len())?;
    for request in &input.requests {
        write!(
            out,
            "{} {} {} {} {}",
            request.priority.code(),
            request.request_tick,
            request.pid,
            request.hospital,
            request.distance
        )?;
        if request.priority == PriorityClass::Emergency {
            write!(out, " {}", request.severity)?;
        }
        writeln!(out)?;
    }
    writeln!(out, "{}", input.cancellations.len())?;
    for cancellation in &input.cancellations {
        writeln!(out, "{} {}", cancellation.tick, cancellation.pid)?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "2
5 10
0 4
4 0

1 1
2 0
3
NP 1 1 1 10
EP 2 2 2 6 7
SP 2 3 1 8
1
3 1
";

    #[test]
    fn parses_every_section() {
        let input = parse_input(SAMPLE).expect("parse");
        assert_eq!(input.hospital_count(), 2);
        assert_eq!(
            input.speeds,
            VehicleSpeeds {
                standard: 5,
                restricted: 10
            }
        );
        assert_eq!(input.distances, vec![vec![0, 4], vec![4, 0]]);
        assert_eq!(
            input.fleets[1],
            FleetSize {
                standard: 2,
                restricted: 0
            }
        );
        assert_eq!(input.requests.len(), 3);
        let emergency = &input.requests[1];
        assert_eq!(emergency.priority, PriorityClass::Emergency);
        assert_eq!(emergency.hospital, HospitalId(2));
        assert_eq!(emergency.severity, 7);
        assert_eq!(input.requests[2].severity, 0);
        assert_eq!(
            input.cancellations,
            vec![CancellationRequest {
                tick: 3,
                pid: PatientId(1)
            }]
        );
    }

    #[test]
    fn written_input_parses_back_to_the_same_value() {
        let input = parse_input(SAMPLE).expect("parse");
        let mut buffer = Vec::new();
        write_input(&input, &mut buffer).expect("write");
        let text = String::from_utf8(buffer).expect("utf8");
        assert_eq!(parse_input(&text).expect("reparse"), input);
    }

    #[test]
    fn emergency_without_severity_is_rejected() {
        let text = "1\n1 1\n0\n1 1\n1\nEP 1 1 1 5\n0\n";
        let err = parse_input(text).expect_err("missing severity");
        assert!(matches!(
            err,
            LoadError::FieldCount {
                line: 6,
                expected: 6,
                found: 5
            }
        ));
    }

    #[test]
    fn reports_bad_tokens_with_line_numbers() {
        let text = "1\n1 x\n0\n1 1\n0\n0\n";
        match parse_input(text) {
            Err(LoadError::InvalidNumber { line, token, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(token, "x");
            }
            other => panic!("unexpected result: {other:?}"),
        }

        let text = "1\n1 1\n0\n1 1\n1\nXP 1 1 1 5\n0\n";
        assert!(matches!(
            parse_input(text),
            Err(LoadError::UnknownPriority { line: 6, .. })
        ));
    }

    #[test]
    fn truncated_and_trailing_input_are_rejected() {
        assert!(matches!(
            parse_input("1\n1 1\n0\n1 1\n2\nNP 1 1 1 5\n"),
            Err(LoadError::UnexpectedEof { .. })
        ));
        assert!(matches!(
            parse_input("1\n1 1\n0\n1 1\n0\n0\nextra\n"),
            Err(LoadError::TrailingContent { line: 7, .. })
        ));
    }

    #[test]
    fn distance_rows_must_have_one_entry_per_hospital() {
        let text = "2\n1 1\n0 1 2\n1 0\n1 1\n1 1\n0\n0\n";
        assert!(matches!(
            parse_input(text),
            Err(LoadError::FieldCount {
                line: 3,
                expected: 2,
                found: 3
            })
        ));
    }
}
