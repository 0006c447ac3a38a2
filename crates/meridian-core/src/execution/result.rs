use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::info::ExecutionInfo;

/// One row of a result, as named column values.
///
/// Values are already decoded by the transport; this layer never looks inside them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    columns: BTreeMap<String, Value>,
}

impl Row {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a column, replacing any previous value with the same name.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// The row as a JSON object keyed by column name.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(self.columns.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self { columns: iter.into_iter().collect() }
    }
}

/// Rows returned by a request, consumed front to back, plus how they were obtained.
#[derive(Debug, Clone)]
pub struct ResultSet {
    rows: VecDeque<Row>,
    info: ExecutionInfo,
}

impl ResultSet {
    #[must_use]
    pub fn new(rows: Vec<Row>, info: ExecutionInfo) -> Self {
        Self { rows: rows.into(), info }
    }

    /// An empty result standing in for a suppressed failure.
    #[must_use]
    pub fn degraded(info: ExecutionInfo) -> Self {
        Self { rows: VecDeque::new(), info }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }

    /// Takes the next row.
    pub fn one(&mut self) -> Option<Row> {
        self.rows.pop_front()
    }

    /// Takes every remaining row.
    pub fn all(&mut self) -> Vec<Row> {
        self.rows.drain(..).collect()
    }

    #[must_use]
    pub const fn execution_info(&self) -> &ExecutionInfo {
        &self.info
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.info.is_degraded()
    }
}

impl Iterator for ResultSet {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        self.one()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.rows.len(), Some(self.rows.len()))
    }
}
