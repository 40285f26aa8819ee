//! Immutable, shareable result of one load.

use crate::data::record::DerivedRecord;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Every derived record of one load, in source order.
///
/// Cloning shares the records; nothing can mutate them after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    records: Arc<[DerivedRecord]>,
}

impl Snapshot {
    pub fn new(records: Vec<DerivedRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    pub fn records(&self) -> &[DerivedRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DerivedRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&DerivedRecord> {
        self.records.first()
    }

    /// Look a student up by code.
    pub fn find(&self, code: i64) -> Option<&DerivedRecord> {
        self.records.iter().find(|r| r.code() == code)
    }

    pub fn codes(&self) -> Vec<i64> {
        self.records.iter().map(DerivedRecord::code).collect()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a DerivedRecord;
    type IntoIter = std::slice::Iter<'a, DerivedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records.iter())
    }
}
