//! Record Derivation Module
//! Turns raw CSV rows into typed student records: numeric coercion, gender
//! normalization, age calculation and score banding.

use crate::data::record::{
    Age, CountField, DerivedRecord, Gender, RawRow, ScoreBand, ScoreField, AGE_COLUMN,
    CODE_COLUMN, GENDER_COLUMN,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

const MILLIS_PER_DAY: f64 = 86_400_000.0;
const DAYS_PER_YEAR: f64 = 365.0;

/// Date-only layouts accepted for a date of birth, read as UTC midnight.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeriveError {
    #[error("line {line}: column `{column}` is not a number: {value:?}")]
    InvalidNumber {
        line: usize,
        column: String,
        value: String,
    },
    #[error("line {line}: column `code` is not a whole number: {value:?}")]
    InvalidCode { line: usize, value: String },
    #[error("line {line}: column `age` is not a date of birth: {value:?}")]
    InvalidDate { line: usize, value: String },
    #[error("line {line}: no value for required column `{column}`")]
    MissingValue { line: usize, column: String },
    #[error("line {line}: student code {code} already used on line {first_line}")]
    DuplicateCode {
        line: usize,
        code: i64,
        first_line: usize,
    },
}

/// Band a score into `<5`, `5-9`, `10-14` or `>14`.
pub fn score_range(score: f64) -> ScoreBand {
    ScoreBand::of(score)
}

pub fn normalize_gender(code: &str) -> Gender {
    Gender::from_code(code)
}

/// Whole years between `date_of_birth` and `now`, as `floor(days / 365)`.
///
/// Days are fractional and leap years are not accounted for.
pub fn calc_age(date_of_birth: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let elapsed_days = (now - date_of_birth).num_milliseconds() as f64 / MILLIS_PER_DAY;
    (elapsed_days / DAYS_PER_YEAR).floor() as i64
}

/// Parse a date of birth. RFC 3339 timestamps keep their offset; everything
/// else is taken as UTC.
pub fn parse_date_of_birth(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt.and_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Derives typed records from raw rows against a fixed clock.
pub struct RecordTransformer {
    now: DateTime<Utc>,
}

impl RecordTransformer {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Transform a single row.
    pub fn transform(&self, row: &RawRow) -> Result<DerivedRecord, DeriveError> {
        let gender = normalize_gender(required(row, GENDER_COLUMN)?);

        let dob_text = required(row, AGE_COLUMN)?;
        let date_of_birth =
            parse_date_of_birth(dob_text).ok_or_else(|| DeriveError::InvalidDate {
                line: row.line,
                value: dob_text.to_string(),
            })?;
        let age = Age {
            years: calc_age(date_of_birth, self.now),
        };

        let code = parse_code(row)?;

        let mut scores = [None; 6];
        for (slot, field) in scores.iter_mut().zip(ScoreField::ALL) {
            *slot = parse_numeric(row, field.column())?;
        }
        let mut counts = [None; 2];
        for (slot, field) in counts.iter_mut().zip(CountField::ALL) {
            *slot = parse_numeric(row, field.column())?;
        }

        let attributes: BTreeMap<String, String> = row
            .fields
            .iter()
            .filter(|(column, _)| !is_typed_column(column))
            .map(|(column, value)| (column.clone(), value.clone()))
            .collect();

        Ok(DerivedRecord::new(code, gender, age, scores, counts, attributes))
    }

    /// Transform all rows in parallel, keeping input order.
    ///
    /// The error reported is the one from the earliest failing row.
    pub fn transform_all(&self, rows: &[RawRow]) -> Result<Vec<DerivedRecord>, DeriveError> {
        let results: Vec<Result<DerivedRecord, DeriveError>> =
            rows.par_iter().map(|row| self.transform(row)).collect();
        let records = results.into_iter().collect::<Result<Vec<_>, _>>()?;

        let mut seen: HashMap<i64, usize> = HashMap::with_capacity(records.len());
        for (row, record) in rows.iter().zip(&records) {
            if let Some(&first_line) = seen.get(&record.code()) {
                return Err(DeriveError::DuplicateCode {
                    line: row.line,
                    code: record.code(),
                    first_line,
                });
            }
            seen.insert(record.code(), row.line);
        }

        debug!(records = records.len(), now = %self.now, "derived student records");
        Ok(records)
    }
}

fn is_typed_column(column: &str) -> bool {
    column == GENDER_COLUMN
        || column == AGE_COLUMN
        || column == CODE_COLUMN
        || ScoreField::ALL
            .iter()
            .any(|f| f.column() == column || f.range_column() == column)
        || CountField::ALL.iter().any(|f| f.column() == column)
}

fn required<'a>(row: &'a RawRow, column: &str) -> Result<&'a str, DeriveError> {
    row.get(column).ok_or_else(|| DeriveError::MissingValue {
        line: row.line,
        column: column.to_string(),
    })
}

/// Absent column or empty cell is missing; anything else must be a finite number.
fn parse_numeric(row: &RawRow, column: &str) -> Result<Option<f64>, DeriveError> {
    let Some(raw) = row.get(column) else {
        return Ok(None);
    };
    let text = raw.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(DeriveError::InvalidNumber {
            line: row.line,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

fn parse_code(row: &RawRow) -> Result<i64, DeriveError> {
    let raw = required(row, CODE_COLUMN)?;
    let text = raw.trim();
    if text.is_empty() {
        return Err(DeriveError::MissingValue {
            line: row.line,
            column: CODE_COLUMN.to_string(),
        });
    }
    if let Ok(code) = text.parse::<i64>() {
        return Ok(code);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value.fract() == 0.0 => Ok(value as i64),
        _ => Err(DeriveError::InvalidCode {
            line: row.line,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Months, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn row(line: usize, pairs: &[(&str, &str)]) -> RawRow {
        let mut row = RawRow::new(line);
        for (column, value) in pairs {
            row.fields.insert(column.to_string(), value.to_string());
        }
        row
    }

    #[test]
    fn score_range_boundaries() {
        assert_eq!(score_range(4.999).label(), "<5");
        assert_eq!(score_range(5.0).label(), "5-9");
        assert_eq!(score_range(9.999).label(), "5-9");
        assert_eq!(score_range(10.0).label(), "10-14");
        assert_eq!(score_range(14.999).label(), "10-14");
        assert_eq!(score_range(15.0).label(), ">14");
        assert_eq!(score_range(0.0).label(), "<5");
        assert_eq!(score_range(20.0).label(), ">14");
    }

    #[test]
    fn gender_normalization() {
        assert_eq!(normalize_gender("F"), Gender::Female);
        assert_eq!(normalize_gender("M"), Gender::Male);
        assert_eq!(normalize_gender(""), Gender::Male);
        assert_eq!(normalize_gender("X"), Gender::Male);
        assert_eq!(normalize_gender("f"), Gender::Male);
    }

    #[test]
    fn age_is_floor_of_days_over_365() {
        let now = now();
        let dob = now.checked_sub_months(Months::new(240)).unwrap() - Duration::days(10);
        assert_eq!(calc_age(dob, now), 20);
        assert_eq!(calc_age(now - Duration::days(365), now), 1);
        assert_eq!(calc_age(now - Duration::days(364), now), 0);
    }

    #[test]
    fn date_of_birth_formats() {
        let expected = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date_of_birth("2000-01-01"), Some(expected));
        assert_eq!(parse_date_of_birth(" 2000/01/01 "), Some(expected));
        assert_eq!(parse_date_of_birth("01/01/2000"), Some(expected));
        assert_eq!(parse_date_of_birth("2000-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_date_of_birth("2000-01-01 00:00:00"), Some(expected));
        assert_eq!(parse_date_of_birth("yesterday"), None);
        assert_eq!(parse_date_of_birth(""), None);
    }

    #[test]
    fn transform_derives_all_fields() {
        let transformer = RecordTransformer::new(now());
        let raw = row(
            2,
            &[
                ("gender", "F"),
                ("age", "2000-01-01"),
                ("code", "101"),
                ("primary_score", "12"),
                ("math_score", " 7.5 "),
                ("college_score", ""),
                ("number_of_teachers", "3"),
                ("work", "Yes"),
            ],
        );
        let record = transformer.transform(&raw).expect("valid row");
        assert_eq!(record.code(), 101);
        assert_eq!(record.gender(), Gender::Female);
        assert_eq!(record.age().to_string(), "24 years old");
        assert_eq!(record.score(ScoreField::Primary), Some(12.0));
        assert_eq!(record.band(ScoreField::Primary), Some(ScoreBand::From10To14));
        assert_eq!(record.score(ScoreField::Math), Some(7.5));
        assert_eq!(record.score(ScoreField::College), None);
        assert_eq!(record.score(ScoreField::Current), None);
        assert_eq!(record.count(CountField::NumberOfTeachers), Some(3.0));
        assert_eq!(record.attribute("work"), Some("Yes"));
        assert_eq!(record.attribute("gender"), None);
        assert_eq!(record.attributes().len(), 1);
    }

    #[test]
    fn invalid_number_names_line_and_column() {
        let transformer = RecordTransformer::new(now());
        let raw = row(
            5,
            &[("gender", "M"), ("age", "2001-03-04"), ("code", "3"), ("math_score", "abc")],
        );
        let err = transformer.transform(&raw).unwrap_err();
        assert_eq!(
            err,
            DeriveError::InvalidNumber {
                line: 5,
                column: "math_score".to_string(),
                value: "abc".to_string(),
            }
        );
        assert!(err.to_string().contains("line 5"));
        assert!(err.to_string().contains("math_score"));
    }

    #[test]
    fn derived_keys_are_not_passed_through() {
        let transformer = RecordTransformer::new(now());
        let raw = row(
            2,
            &[
                ("gender", "F"),
                ("age", "2001-03-04"),
                ("code", "3"),
                ("primary_score", "16"),
                ("primary_score_range", "<5"),
                ("work", "No"),
            ],
        );
        let record = transformer.transform(&raw).unwrap();
        assert_eq!(record.attribute("primary_score_range"), None);
        assert_eq!(record.category("primary_score_range").as_deref(), Some(">14"));
        assert_eq!(
            record.attributes().keys().collect::<Vec<_>>(),
            vec!["work"]
        );

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json.matches("\"primary_score_range\"").count(), 1);
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let transformer = RecordTransformer::new(now());
        let raw = row(
            2,
            &[("gender", "M"), ("age", "2001-03-04"), ("code", "3"), ("math_score", "NaN")],
        );
        assert!(matches!(
            transformer.transform(&raw),
            Err(DeriveError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn code_must_be_whole() {
        let transformer = RecordTransformer::new(now());
        let base = [("gender", "M"), ("age", "2001-03-04")];

        let mut pairs = base.to_vec();
        pairs.push(("code", "12.0"));
        assert_eq!(transformer.transform(&row(2, &pairs)).unwrap().code(), 12);

        let mut pairs = base.to_vec();
        pairs.push(("code", "12.5"));
        assert!(matches!(
            transformer.transform(&row(2, &pairs)),
            Err(DeriveError::InvalidCode { line: 2, .. })
        ));

        let mut pairs = base.to_vec();
        pairs.push(("code", ""));
        assert!(matches!(
            transformer.transform(&row(2, &pairs)),
            Err(DeriveError::MissingValue { .. })
        ));
    }

    #[test]
    fn invalid_date_is_rejected() {
        let transformer = RecordTransformer::new(now());
        let raw = row(3, &[("gender", "M"), ("age", "not a date"), ("code", "3")]);
        assert!(matches!(
            transformer.transform(&raw),
            Err(DeriveError::InvalidDate { line: 3, .. })
        ));
    }

    #[test]
    fn transform_all_keeps_order_and_reports_first_error() {
        let transformer = RecordTransformer::new(now());
        let rows: Vec<RawRow> = (0..50)
            .map(|i| {
                let code = (1000 - i).to_string();
                row(i + 2, &[("gender", "F"), ("age", "2005-06-07"), ("code", code.as_str())])
            })
            .collect();
        let records = transformer.transform_all(&rows).expect("valid rows");
        let codes: Vec<i64> = records.iter().map(|r| r.code()).collect();
        let expected: Vec<i64> = (0..50).map(|i| 1000 - i as i64).collect();
        assert_eq!(codes, expected);

        let mut broken = rows.clone();
        broken[10].fields.insert("math_score".into(), "x".into());
        broken[30].fields.insert("math_score".into(), "y".into());
        match transformer.transform_all(&broken) {
            Err(DeriveError::InvalidNumber { line, .. }) => assert_eq!(line, 12),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn duplicate_codes_are_rejected() {
        let transformer = RecordTransformer::new(now());
        let rows = vec![
            row(2, &[("gender", "F"), ("age", "2005-06-07"), ("code", "9")]),
            row(3, &[("gender", "M"), ("age", "2005-06-07"), ("code", "9")]),
        ];
        assert_eq!(
            transformer.transform_all(&rows).unwrap_err(),
            DeriveError::DuplicateCode {
                line: 3,
                code: 9,
                first_line: 2
            }
        );
    }
}
