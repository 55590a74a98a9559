//! Ordered, duplicate-free list of factor column names.

use crate::error::{DataError, Result};
use crate::schema::{FACTOR_LIST_COLUMN, require_columns};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Factor names in a stable order.
///
/// Persisted as a single-column table (`variable`) next to the panel it describes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorList(Vec<String>);

impl FactorList {
    /// Build a factor list, rejecting duplicate names.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for name in names {
            let name = name.into();
            if !seen.insert(name.clone()) {
                return Err(DataError::DuplicateFactor(name));
            }
            out.push(name);
        }
        Ok(Self(out))
    }

    /// Factor names.
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Number of factors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `name` is in the list.
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    /// Iterate over names.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Check that every factor is a column of `frame`.
    pub fn ensure_columns_of(&self, frame: &DataFrame) -> Result<()> {
        require_columns(frame, &self.0)
    }

    /// Table form: one `variable` column, one row per factor.
    pub fn to_frame(&self) -> Result<DataFrame> {
        let column = Column::new(FACTOR_LIST_COLUMN.into(), self.0.clone());
        Ok(DataFrame::new(vec![column])?)
    }

    /// Parse the table form written by [`FactorList::to_frame`].
    pub fn from_frame(frame: &DataFrame) -> Result<Self> {
        require_columns(frame, &[FACTOR_LIST_COLUMN])?;
        let names = frame.column(FACTOR_LIST_COLUMN)?.cast(&DataType::String)?;
        let names = names.str()?;
        if names.null_count() > 0 {
            return Err(DataError::Schema(format!(
                "empty entries in `{FACTOR_LIST_COLUMN}`"
            )));
        }
        Self::new(names.into_no_null_iter().map(str::to_string))
    }

    /// Consume into the underlying names.
    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a FactorList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_duplicates() {
        let err = FactorList::new(["be_me", "ret_1_0", "be_me"]).unwrap_err();
        assert!(matches!(err, DataError::DuplicateFactor(name) if name == "be_me"));
    }

    #[test]
    fn test_frame_round_trip_preserves_order() {
        let factors = FactorList::new(["z", "a", "m"]).unwrap();
        let frame = factors.to_frame().unwrap();
        assert_eq!(frame.height(), 3);
        assert_eq!(FactorList::from_frame(&frame).unwrap(), factors);
    }

    #[test]
    fn test_ensure_columns_of() {
        let df = df!["a" => [1.0], "b" => [2.0]].unwrap();
        assert!(FactorList::new(["a"]).unwrap().ensure_columns_of(&df).is_ok());
        assert!(FactorList::new(["a", "c"]).unwrap().ensure_columns_of(&df).is_err());
    }
}
