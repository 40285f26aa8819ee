//! Data module - CSV loading and record derivation

mod derive;
mod loader;
mod record;
mod snapshot;
mod source;

pub use derive::{calc_age, normalize_gender, parse_date_of_birth, score_range, DeriveError, RecordTransformer};
pub use loader::{parse_rows, LoadError, LoadOptions, ParseError, RecordLoader, DEFAULT_FETCH_TIMEOUT};
pub use record::{
    Age, CountField, DerivedRecord, Gender, NumericField, RawRow, ScoreBand, ScoreField,
    AGE_COLUMN, CODE_COLUMN, GENDER_COLUMN, REQUIRED_COLUMNS,
};
pub use snapshot::Snapshot;
pub use source::{FetchError, Source};
