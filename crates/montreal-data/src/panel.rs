//! Entity-month panel of factor data.

use crate::error::{DataError, Result};
use crate::factor_list::FactorList;
use crate::schema::{
    DATE, ENTITY, EXTRACT_COLUMNS, column_names, entity_column, is_identifying, require_columns,
};
use polars::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::{BTreeSet, HashSet};

/// Table keyed by (`permno`, `date`) with one row per entity-month.
///
/// The key is validated on construction, so every `Panel` in circulation has a
/// unique (entity, date) pair per row.
#[derive(Debug, Clone)]
pub struct Panel {
    frame: DataFrame,
}

impl Panel {
    /// Wrap a frame, checking the key columns and their uniqueness.
    pub fn new(frame: DataFrame) -> Result<Self> {
        require_columns(&frame, &[ENTITY, DATE])?;
        check_unique_keys(&frame)?;
        Ok(Self { frame })
    }

    /// Underlying frame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Consume into the underlying frame.
    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Whether the panel has no rows.
    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Column names.
    pub fn column_names(&self) -> Vec<String> {
        column_names(&self.frame)
    }

    /// Columns that are neither identifying fields nor the target.
    pub fn factor_columns(&self) -> Vec<String> {
        self.column_names()
            .into_iter()
            .filter(|name| !is_identifying(name))
            .collect()
    }

    /// Distinct entity ids, ascending.
    pub fn entity_ids(&self) -> Result<Vec<i64>> {
        let ids: BTreeSet<i64> = entity_column(&self.frame)?.into_iter().collect();
        Ok(ids.into_iter().collect())
    }

    /// Draw `n` distinct entities with a seeded generator.
    ///
    /// Returns every entity when the panel has `n` or fewer. The result is sorted
    /// so the same seed always yields the same subset in the same order.
    pub fn sample_entities(&self, n: usize, seed: u64) -> Result<Vec<i64>> {
        let ids = self.entity_ids()?;
        if n >= ids.len() {
            return Ok(ids);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut sample: Vec<i64> = ids.choose_multiple(&mut rng, n).copied().collect();
        sample.sort_unstable();
        Ok(sample)
    }

    /// Project onto the extract columns plus `factors`, optionally keeping only
    /// the listed entities.
    pub fn extract(&self, factors: &FactorList, entities: Option<&[i64]>) -> Result<Self> {
        factors.ensure_columns_of(&self.frame)?;
        let names = self.column_names();
        let mut selection: Vec<String> = EXTRACT_COLUMNS
            .iter()
            .filter(|c| names.iter().any(|n| n == *c))
            .map(|c| c.to_string())
            .collect();
        selection.extend(factors.iter().cloned());

        let mut frame = self.frame.select(selection)?;
        if let Some(entities) = entities {
            let keep: HashSet<i64> = entities.iter().copied().collect();
            let mask: BooleanChunked = entity_column(&frame)?
                .into_iter()
                .map(|id| keep.contains(&id))
                .collect();
            frame = frame.filter(&mask)?;
        }
        Ok(Self { frame })
    }
}

fn check_unique_keys(frame: &DataFrame) -> Result<()> {
    let entities = entity_column(frame)?;
    let dates = frame.column(DATE)?.cast(&DataType::String)?;
    let dates = dates.str()?;

    let mut seen = HashSet::with_capacity(entities.len());
    for (entity, date) in entities.into_iter().zip(dates.into_iter()) {
        let date = date.unwrap_or_default();
        if !seen.insert((entity, date)) {
            return Err(DataError::DuplicateKey {
                entity,
                date: date.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 28).unwrap()
    }

    fn sample_frame() -> DataFrame {
        df![
            "permno" => [10i64, 10, 20, 20, 30],
            "date" => [d(2020, 1), d(2020, 2), d(2020, 1), d(2020, 2), d(2020, 1)],
            "year" => [2020i64, 2020, 2020, 2020, 2020],
            "month" => [1i64, 2, 1, 2, 1],
            "comp_name" => ["A", "A", "B", "B", "C"],
            "stock_exret" => [0.01, 0.02, -0.01, 0.03, 0.0],
            "be_me" => [0.1, 0.2, 0.3, 0.4, 0.5],
            "ret_1_0" => [1.0, 2.0, 3.0, 4.0, 5.0]
        ]
        .unwrap()
    }

    #[test]
    fn test_rejects_duplicate_keys() {
        let df = df![
            "permno" => [1i64, 1],
            "date" => [d(2020, 1), d(2020, 1)]
        ]
        .unwrap();
        assert!(matches!(
            Panel::new(df),
            Err(DataError::DuplicateKey { entity: 1, .. })
        ));
    }

    #[test]
    fn test_factor_columns_and_entities() {
        let panel = Panel::new(sample_frame()).unwrap();
        assert_eq!(panel.factor_columns(), vec!["be_me", "ret_1_0"]);
        assert_eq!(panel.entity_ids().unwrap(), vec![10, 20, 30]);
    }

    #[test]
    fn test_extract_restricts_columns_and_entities() {
        let panel = Panel::new(sample_frame()).unwrap();
        let factors = FactorList::new(["ret_1_0"]).unwrap();
        let extracted = panel.extract(&factors, Some(&[20])).unwrap();

        assert_eq!(
            extracted.column_names(),
            vec!["date", "year", "month", "permno", "stock_exret", "ret_1_0"]
        );
        assert_eq!(extracted.entity_ids().unwrap(), vec![20]);
        assert_eq!(extracted.height(), 2);
    }

    #[test]
    fn test_sample_entities_is_reproducible() {
        let panel = Panel::new(sample_frame()).unwrap();
        let a = panel.sample_entities(2, 42).unwrap();
        let b = panel.sample_entities(2, 42).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(panel.sample_entities(10, 1).unwrap(), vec![10, 20, 30]);
    }
}
