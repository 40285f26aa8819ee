//! Record Types Module
//! Raw CSV rows and the typed student records derived from them.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

pub const GENDER_COLUMN: &str = "gender";
pub const AGE_COLUMN: &str = "age";
pub const CODE_COLUMN: &str = "code";

/// Columns every dataset header must name.
pub const REQUIRED_COLUMNS: [&str; 3] = [GENDER_COLUMN, AGE_COLUMN, CODE_COLUMN];

/// One data row exactly as the CSV parser yields it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source (the header is line 1).
    pub line: usize,
    pub fields: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            fields: BTreeMap::new(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// The six graded scores, in radar axis order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScoreField {
    ArabicLanguage,
    College,
    Current,
    FirstLanguage,
    Math,
    Primary,
}

impl ScoreField {
    pub const ALL: [ScoreField; 6] = [
        ScoreField::ArabicLanguage,
        ScoreField::College,
        ScoreField::Current,
        ScoreField::FirstLanguage,
        ScoreField::Math,
        ScoreField::Primary,
    ];

    pub fn column(self) -> &'static str {
        match self {
            ScoreField::ArabicLanguage => "arabic_language_score",
            ScoreField::College => "college_score",
            ScoreField::Current => "current_score",
            ScoreField::FirstLanguage => "first_language_score",
            ScoreField::Math => "math_score",
            ScoreField::Primary => "primary_score",
        }
    }

    /// Name of the derived bucket column, e.g. `primary_score_range`.
    pub fn range_column(self) -> &'static str {
        match self {
            ScoreField::ArabicLanguage => "arabic_language_score_range",
            ScoreField::College => "college_score_range",
            ScoreField::Current => "current_score_range",
            ScoreField::FirstLanguage => "first_language_score_range",
            ScoreField::Math => "math_score_range",
            ScoreField::Primary => "primary_score_range",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreField::ArabicLanguage => "Arabic Language Score",
            ScoreField::College => "College Score",
            ScoreField::Current => "Current Score",
            ScoreField::FirstLanguage => "First Language Score",
            ScoreField::Math => "Math Score",
            ScoreField::Primary => "Primary Score",
        }
    }

    pub fn abbrev(self) -> &'static str {
        match self {
            ScoreField::ArabicLanguage => "ALS",
            ScoreField::College => "CoS",
            ScoreField::Current => "CuS",
            ScoreField::FirstLanguage => "FLS",
            ScoreField::Math => "MS",
            ScoreField::Primary => "PS",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Count fields that are numeric but never banded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CountField {
    NumberOfRepetition,
    NumberOfTeachers,
}

impl CountField {
    pub const ALL: [CountField; 2] = [CountField::NumberOfRepetition, CountField::NumberOfTeachers];

    pub fn column(self) -> &'static str {
        match self {
            CountField::NumberOfRepetition => "number_of_repetition",
            CountField::NumberOfTeachers => "number_of_teachers",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CountField::NumberOfRepetition => "Number of Repetition",
            CountField::NumberOfTeachers => "Number of Teachers",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Any numeric (non-identity) field of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericField {
    Score(ScoreField),
    Count(CountField),
}

impl NumericField {
    pub const ALL: [NumericField; 8] = [
        NumericField::Score(ScoreField::ArabicLanguage),
        NumericField::Score(ScoreField::College),
        NumericField::Score(ScoreField::Current),
        NumericField::Score(ScoreField::FirstLanguage),
        NumericField::Score(ScoreField::Math),
        NumericField::Count(CountField::NumberOfRepetition),
        NumericField::Count(CountField::NumberOfTeachers),
        NumericField::Score(ScoreField::Primary),
    ];

    pub fn column(self) -> &'static str {
        match self {
            NumericField::Score(field) => field.column(),
            NumericField::Count(field) => field.column(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NumericField::Score(field) => field.label(),
            NumericField::Count(field) => field.label(),
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.column() == column)
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Coarse banding of a score into four ordered ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScoreBand {
    Below5,
    From5To9,
    From10To14,
    Above14,
}

impl ScoreBand {
    pub const ALL: [ScoreBand; 4] = [
        ScoreBand::Below5,
        ScoreBand::From5To9,
        ScoreBand::From10To14,
        ScoreBand::Above14,
    ];

    pub fn of(score: f64) -> Self {
        if score < 5.0 {
            ScoreBand::Below5
        } else if score < 10.0 {
            ScoreBand::From5To9
        } else if score < 15.0 {
            ScoreBand::From10To14
        } else {
            ScoreBand::Above14
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Below5 => "<5",
            ScoreBand::From5To9 => "5-9",
            ScoreBand::From10To14 => "10-14",
            ScoreBand::Above14 => ">14",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    /// `"F"` is female, every other code (including empty) is male.
    pub fn from_code(code: &str) -> Self {
        if code == "F" {
            Gender::Female
        } else {
            Gender::Male
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whole years since birth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Age {
    pub years: i64,
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} years old", self.years)
    }
}

/// Typed, enriched student record.
///
/// Score buckets are computed from the stored score on every access, so a
/// record can never carry a bucket that disagrees with its score.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    code: i64,
    gender: Gender,
    age: Age,
    scores: [Option<f64>; 6],
    counts: [Option<f64>; 2],
    attributes: BTreeMap<String, String>,
}

impl DerivedRecord {
    pub(crate) fn new(
        code: i64,
        gender: Gender,
        age: Age,
        scores: [Option<f64>; 6],
        counts: [Option<f64>; 2],
        attributes: BTreeMap<String, String>,
    ) -> Self {
        Self {
            code,
            gender,
            age,
            scores,
            counts,
            attributes,
        }
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn age(&self) -> Age {
        self.age
    }

    /// `None` when the column is absent or the cell was empty.
    pub fn score(&self, field: ScoreField) -> Option<f64> {
        self.scores[field.index()]
    }

    pub fn band(&self, field: ScoreField) -> Option<ScoreBand> {
        self.score(field).map(ScoreBand::of)
    }

    pub fn count(&self, field: CountField) -> Option<f64> {
        self.counts[field.index()]
    }

    pub fn numeric(&self, field: NumericField) -> Option<f64> {
        match field {
            NumericField::Score(field) => self.score(field),
            NumericField::Count(field) => self.count(field),
        }
    }

    /// Pass-through categorical column.
    pub fn attribute(&self, column: &str) -> Option<&str> {
        self.attributes.get(column).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Display value of any column, derived or passed through.
    pub fn category(&self, key: &str) -> Option<String> {
        if key == GENDER_COLUMN {
            return Some(self.gender.to_string());
        }
        if key == AGE_COLUMN {
            return Some(self.age.to_string());
        }
        if key == CODE_COLUMN {
            return Some(self.code.to_string());
        }
        if let Some(field) = NumericField::from_column(key) {
            return self.numeric(field).map(|v| v.to_string());
        }
        if let Some(field) = ScoreField::ALL.into_iter().find(|f| f.range_column() == key) {
            return self.band(field).map(|band| band.label().to_string());
        }
        self.attribute(key).map(str::to_string)
    }
}

impl Serialize for DerivedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.attributes.len() + 3 + NumericField::ALL.len() + ScoreField::ALL.len();
        let mut map = serializer.serialize_map(Some(len))?;
        for (column, value) in &self.attributes {
            map.serialize_entry(column, value)?;
        }
        map.serialize_entry(GENDER_COLUMN, self.gender.label())?;
        map.serialize_entry(AGE_COLUMN, &self.age.to_string())?;
        map.serialize_entry(CODE_COLUMN, &self.code)?;
        for field in NumericField::ALL {
            map.serialize_entry(field.column(), &self.numeric(field))?;
        }
        for field in ScoreField::ALL {
            map.serialize_entry(field.range_column(), &self.band(field).map(ScoreBand::label))?;
        }
        map.end()
    }
}
