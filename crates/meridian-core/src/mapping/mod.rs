//! Row-to-entity mapping over a [`ResultSet`].
//!
//! Mapping is a stateless per-row transform. [`MappedResult`] holds the cursor and forwards
//! execution metadata from the underlying result untouched; it never retries or selects hosts.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::execution::{ExecutionInfo, ResultSet, Row};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MappingError {
    /// `next_entity` was called after the last row was consumed.
    #[error("no more rows to map")]
    Exhausted,

    #[error("column `{0}` is missing or has the wrong type")]
    Column(String),

    #[error("failed to map row: {0}")]
    Deserialize(#[from] serde_json::Error),
}

/// Turns one row into one entity.
pub trait EntityMapper<T>: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`MappingError`] if the row does not fit `T`.
    fn map_row(&self, row: &Row) -> Result<T, MappingError>;
}

/// Maps a row's named columns onto the fields of any deserializable type.
///
/// Null columns are dropped before deserializing, so they behave like missing columns and leave
/// the field to its serde default.
pub struct SerdeMapper<T> {
    _entity: PhantomData<fn() -> T>,
}

impl<T> SerdeMapper<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self { _entity: PhantomData }
    }
}

impl<T> Default for SerdeMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SerdeMapper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerdeMapper").field("entity", &std::any::type_name::<T>()).finish()
    }
}

impl<T: DeserializeOwned> EntityMapper<T> for SerdeMapper<T> {
    fn map_row(&self, row: &Row) -> Result<T, MappingError> {
        let object: Map<String, Value> = row
            .columns()
            .filter(|(_, value)| !value.is_null())
            .map(|(name, value)| (name.to_owned(), value.clone()))
            .collect();
        Ok(serde_json::from_value(Value::Object(object))?)
    }
}

/// Typed view over a [`ResultSet`].
#[derive(Debug)]
pub struct MappedResult<T, M = SerdeMapper<T>> {
    rows: ResultSet,
    mapper: M,
    _entity: PhantomData<fn() -> T>,
}

impl<T, M: EntityMapper<T>> MappedResult<T, M> {
    #[must_use]
    pub const fn new(rows: ResultSet, mapper: M) -> Self {
        Self { rows, mapper, _entity: PhantomData }
    }

    #[must_use]
    pub fn has_more(&self) -> bool {
        !self.rows.is_exhausted()
    }

    /// Maps the next row and advances the cursor.
    ///
    /// # Errors
    ///
    /// [`MappingError::Exhausted`] once every row has been consumed, or the mapper's error for
    /// a row that does not fit. A row that fails to map is still consumed.
    pub fn next_entity(&mut self) -> Result<T, MappingError> {
        let row = self.rows.one().ok_or(MappingError::Exhausted)?;
        self.mapper.map_row(&row)
    }

    /// Maps every remaining row.
    ///
    /// # Errors
    ///
    /// Stops at the first row that fails to map.
    pub fn drain_all(&mut self) -> Result<Vec<T>, MappingError> {
        self.rows.all().iter().map(|row| self.mapper.map_row(row)).collect()
    }

    /// Execution metadata of the underlying result, unchanged.
    #[must_use]
    pub const fn execution_info(&self) -> &ExecutionInfo {
        self.rows.execution_info()
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.rows.is_degraded()
    }

    /// The underlying result with whatever rows are left.
    #[must_use]
    pub fn into_inner(self) -> ResultSet {
        self.rows
    }
}

impl<T, M: EntityMapper<T>> Iterator for MappedResult<T, M> {
    type Item = Result<T, MappingError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.one().map(|row| self.mapper.map_row(&row))
    }
}
