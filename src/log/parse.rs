use crate::error::ParseError;
use crate::location::Location;
use crate::log::record::{Experiment, Kind, LatencyPoint, Record, ThroughputPoint};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

/// Parse one non-empty profile line into a typed record.
///
/// Two encodings are accepted:
/// - a JSON object (line starts with `{`), e.g.
///   `{"type":"experiment","selected":"foo.c:10","speedup":0,"duration":1000}`
/// - tab-separated `kind\tkey=value\t...`, e.g.
///   `progress-point\tname=main-loop\ttype=source\tdelta=100`
///
/// Unknown kinds are returned as [`Record::Unknown`] rather than an error so
/// the caller can decide how loudly to complain.
pub fn parse_line(raw: &str) -> Result<Record, ParseError> {
    if raw.starts_with('{') {
        parse_json_line(raw)
    } else {
        parse_tagged_line(raw)
    }
}

/// Split a whole profile into numbered, parsed lines (1-based), skipping
/// empty lines. The raw text is handed back for diagnostics.
pub fn parse_profile_text(
    text: &str,
) -> impl Iterator<Item = (usize, &str, Result<Record, ParseError>)> {
    text.split('\n').enumerate().filter_map(|(lineno, line)| {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            return None;
        }
        Some((lineno + 1, line, parse_line(line)))
    })
}

fn parse_json_line(raw: &str) -> Result<Record, ParseError> {
    let value: Value = serde_json::from_str(raw).map_err(ParseError::Json)?;
    let tag = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let Some(kind) = Kind::from_tag(&tag) else {
        return Ok(Record::Unknown { kind: tag });
    };

    match kind {
        Kind::Experiment => {
            let experiment: Experiment = from_json(&tag, value)?;
            experiment
                .check_speedup()
                .map_err(|problem| ParseError::Field { kind: tag, problem })?;
            Ok(Record::Experiment(experiment))
        }
        Kind::Throughput => Ok(Record::Throughput(from_json(&tag, value)?)),
        Kind::Latency => Ok(Record::Latency(from_json(&tag, value)?)),
        Kind::Ignored(ignored) => Ok(Record::Ignored(ignored)),
    }
}

fn from_json<T: DeserializeOwned>(tag: &str, value: Value) -> Result<T, ParseError> {
    serde_json::from_value(value).map_err(|source| ParseError::Record {
        kind: tag.to_string(),
        source,
    })
}

fn parse_tagged_line(raw: &str) -> Result<Record, ParseError> {
    let fields = Fields::split(raw);

    let Some(kind) = Kind::from_tag(fields.kind) else {
        return Ok(Record::Unknown {
            kind: fields.kind.to_string(),
        });
    };

    match kind {
        Kind::Experiment => {
            let experiment = Experiment {
                selected: Location::new(fields.string("selected")?),
                speedup: fields.float("speedup")?,
                duration: fields.int("duration")?,
            };
            experiment
                .check_speedup()
                .map_err(|problem| fields.problem(problem))?;
            Ok(Record::Experiment(experiment))
        }
        Kind::Throughput => Ok(Record::Throughput(ThroughputPoint {
            name: fields.string("name")?,
            delta: fields.int("delta")?,
            point_type: fields.get("point-type").map(str::to_string),
        })),
        Kind::Latency => Ok(Record::Latency(LatencyPoint {
            name: fields.string("name")?,
            arrivals: fields.int("arrivals")?,
            departures: fields.int("departures")?,
            difference: fields.int("difference")?,
        })),
        Kind::Ignored(ignored) => Ok(Record::Ignored(ignored)),
    }
}

/// Key-value fields of one tab-separated line.
struct Fields<'a> {
    kind: &'a str,
    values: BTreeMap<&'a str, &'a str>,
}

impl<'a> Fields<'a> {
    fn split(raw: &'a str) -> Self {
        let mut parts = raw.split('\t');
        let kind = parts.next().unwrap_or_default();

        let mut values = BTreeMap::new();
        for part in parts {
            // Fields without '=' carry nothing we can use.
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            let key = match key {
                // Progress points carry their own `type`; keep it apart from the record kind.
                "type" if kind == "progress-point" => "point-type",
                // The leading kind wins: a stray `type` does not turn the line
                // into an unknown record.
                "type" => continue,
                other => other,
            };
            values.insert(key, value);
        }

        Fields { kind, values }
    }

    fn get(&self, key: &str) -> Option<&'a str> {
        self.values.get(key).copied()
    }

    fn require(&self, key: &str) -> Result<&'a str, ParseError> {
        self.get(key)
            .ok_or_else(|| self.problem(format!("missing field `{}`", key)))
    }

    fn string(&self, key: &str) -> Result<String, ParseError> {
        self.require(key).map(str::to_string)
    }

    fn int(&self, key: &str) -> Result<i64, ParseError> {
        let raw = self.require(key)?;
        raw.trim().parse().map_err(|_| {
            self.problem(format!("field `{}` is not an integer: {:?}", key, raw))
        })
    }

    fn float(&self, key: &str) -> Result<f64, ParseError> {
        let raw = self.require(key)?;
        raw.trim()
            .parse()
            .map_err(|_| self.problem(format!("field `{}` is not a number: {:?}", key, raw)))
    }

    fn problem(&self, problem: String) -> ParseError {
        ParseError::Field {
            kind: self.kind.to_string(),
            problem,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::record::IgnoredKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn tagged_experiment() {
        let rec = parse_line("experiment\tselected=foo.c:10\tspeedup=50\tduration=1000").unwrap();
        assert_eq!(
            rec,
            Record::Experiment(Experiment {
                selected: Location::from("foo.c:10"),
                speedup: 50.0,
                duration: 1000,
            })
        );
    }

    #[test]
    fn progress_point_type_is_remapped() {
        let rec = parse_line("progress-point\tname=main-loop\ttype=source\tdelta=100").unwrap();
        assert_eq!(
            rec,
            Record::Throughput(ThroughputPoint {
                name: "main-loop".to_string(),
                delta: 100,
                point_type: Some("source".to_string()),
            })
        );
    }

    #[test]
    fn type_key_does_not_override_other_kinds() {
        let rec = parse_line("throughput-point\tname=p\ttype=latency-point\tdelta=7").unwrap();
        match rec {
            Record::Throughput(p) => {
                assert_eq!(p.delta, 7);
                assert_eq!(p.point_type, None);
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn fields_without_equals_are_skipped() {
        let rec = parse_line("latency-point\tname=q\tjunk\tarrivals=9\tdepartures=8\tdifference=2")
            .unwrap();
        assert_eq!(
            rec,
            Record::Latency(LatencyPoint {
                name: "q".to_string(),
                arrivals: 9,
                departures: 8,
                difference: 2,
            })
        );
    }

    #[test]
    fn value_may_contain_equals() {
        let rec = parse_line("progress-point\tname=a=b\tdelta=1").unwrap();
        match rec {
            Record::Throughput(p) => assert_eq!(p.name, "a=b"),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn lifecycle_lines_are_ignored() {
        assert_eq!(
            parse_line("startup\ttime=123").unwrap(),
            Record::Ignored(IgnoredKind::Startup)
        );
        assert_eq!(
            parse_line("samples\tlocation=foo.c:1\tcount=4").unwrap(),
            Record::Ignored(IgnoredKind::Samples)
        );
        assert_eq!(
            parse_line("runtime\ttime=99").unwrap(),
            Record::Ignored(IgnoredKind::Runtime)
        );
    }

    #[test]
    fn unknown_kind() {
        assert_eq!(
            parse_line("bogus\tx=1").unwrap(),
            Record::Unknown {
                kind: "bogus".to_string()
            }
        );
    }

    #[test]
    fn missing_field_is_recoverable() {
        let err = parse_line("progress-point\tname=p").unwrap_err();
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("missing field `delta`"));
    }

    #[test]
    fn non_integer_field_is_recoverable() {
        let err = parse_line("experiment\tselected=a:1\tspeedup=0\tduration=soon").unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn speedup_out_of_range_is_rejected() {
        let err = parse_line("experiment\tselected=a:1\tspeedup=150\tduration=10").unwrap_err();
        assert!(err.to_string().contains("outside 0..=100"));
    }

    #[test]
    fn json_experiment() {
        let rec = parse_line(
            r#"{"type":"experiment","selected":"foo.c:10","speedup":25,"duration":400}"#,
        )
        .unwrap();
        assert_eq!(
            rec,
            Record::Experiment(Experiment {
                selected: Location::from("foo.c:10"),
                speedup: 25.0,
                duration: 400,
            })
        );
    }

    #[test]
    fn json_progress_point_reads_point_type_key() {
        let rec = parse_line(
            r#"{"type":"progress-point","name":"p","point-type":"source","delta":3}"#,
        )
        .unwrap();
        match rec {
            Record::Throughput(p) => assert_eq!(p.point_type.as_deref(), Some("source")),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn malformed_json_is_fatal() {
        let err = parse_line(r#"{"type":"experiment","#).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn json_with_wrong_shape_is_fatal() {
        let err = parse_line(r#"{"type":"latency-point","name":"q"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Record { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn json_unknown_type() {
        assert_eq!(
            parse_line(r#"{"type":"mystery"}"#).unwrap(),
            Record::Unknown {
                kind: "mystery".to_string()
            }
        );
    }

    #[test]
    fn profile_text_skips_blank_lines_and_numbers_from_one() {
        let text = "startup\ttime=1\r\n\nexperiment\tselected=a:1\tspeedup=0\tduration=5\n";
        let lines: Vec<usize> = parse_profile_text(text).map(|(n, _, _)| n).collect();
        assert_eq!(lines, vec![1, 3]);
    }
}
