//! Leave-one-season-out fold partition

use crate::data::SeasonTable;
use crate::error::{BracketError, Result};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Train/test row indices of one rotation step
#[derive(Debug, Clone, PartialEq)]
pub struct FoldSplit {
    pub fold: usize,
    pub season: i32,
    /// Indices into [`SeasonTable::rows`] of every other season
    pub train: Vec<usize>,
    /// Indices into [`SeasonTable::rows`] of this season
    pub test: Vec<usize>,
}

/// Partition of a season table by its derived fold index
#[derive(Debug, Clone)]
pub struct FoldPartition {
    splits: Vec<FoldSplit>,
    n_rows: usize,
}

impl FoldPartition {
    /// Group rows by fold. Each fold must hold exactly one season.
    pub fn from_table(table: &SeasonTable) -> Result<Self> {
        let mut groups: BTreeMap<usize, (i32, Vec<usize>)> = BTreeMap::new();
        for (idx, row) in table.rows().iter().enumerate() {
            let entry = groups.entry(row.fold).or_insert_with(|| (row.season, Vec::new()));
            if entry.0 != row.season {
                return Err(BracketError::ValidationError(format!(
                    "fold {} mixes seasons {} and {}",
                    row.fold, entry.0, row.season
                )));
            }
            entry.1.push(idx);
        }

        if groups.len() < 2 {
            return Err(BracketError::ValidationError(format!(
                "rotation needs at least two seasons, found {}",
                groups.len()
            )));
        }

        let expected: Vec<usize> = (1..=groups.len()).collect();
        let found: Vec<usize> = groups.keys().copied().collect();
        if found != expected {
            warn!(folds = ?found, "Fold indices are not contiguous");
        }

        let splits = groups
            .iter()
            .map(|(&fold, (season, test))| {
                let mut train: Vec<usize> = groups
                    .iter()
                    .filter(|(&other, _)| other != fold)
                    .flat_map(|(_, (_, rows))| rows.iter().copied())
                    .collect();
                train.sort_unstable();
                FoldSplit {
                    fold,
                    season: *season,
                    train,
                    test: test.clone(),
                }
            })
            .collect();

        let partition = Self {
            splits,
            n_rows: table.len(),
        };
        partition.verify_coverage()?;
        debug!(folds = partition.len(), rows = partition.n_rows, "Fold partition built");
        Ok(partition)
    }

    /// Every row is tested exactly once and trains every other fold
    pub fn verify_coverage(&self) -> Result<()> {
        let mut tested = vec![0usize; self.n_rows];
        for split in &self.splits {
            if split.train.len() + split.test.len() != self.n_rows {
                return Err(BracketError::ValidationError(format!(
                    "fold {} train and test do not cover the table",
                    split.fold
                )));
            }
            for &i in &split.test {
                tested[i] += 1;
            }
            if split.train.iter().any(|i| split.test.binary_search(i).is_ok()) {
                return Err(BracketError::ValidationError(format!(
                    "fold {} trains on its own test rows",
                    split.fold
                )));
            }
        }
        if let Some(row) = tested.iter().position(|&n| n != 1) {
            return Err(BracketError::ValidationError(format!(
                "row {} is tested {} times",
                row, tested[row]
            )));
        }
        Ok(())
    }

    pub fn splits(&self) -> &[FoldSplit] {
        &self.splits
    }

    pub fn len(&self) -> usize {
        self.splits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TeamSeason;

    fn row(team: &str, season: i32, fold: usize) -> TeamSeason {
        TeamSeason {
            team: team.to_string(),
            season,
            fold,
            numeric: vec![],
            categorical: vec![],
            made_tournament: false,
            seed: None,
            conference_champion: false,
        }
    }

    #[test]
    fn test_partition_covers_every_row_once() {
        let rows = vec![
            row("A", 2017, 1),
            row("B", 2018, 2),
            row("C", 2017, 1),
            row("D", 2021, 4),
        ];
        let table = SeasonTable::new(vec![], vec![], rows).unwrap();
        let partition = FoldPartition::from_table(&table).unwrap();

        assert_eq!(partition.len(), 3);
        let first = &partition.splits()[0];
        assert_eq!(first.season, 2017);
        assert_eq!(first.test, vec![0, 2]);
        assert_eq!(first.train, vec![1, 3]);
    }

    #[test]
    fn test_single_season_rejected() {
        let table = SeasonTable::new(vec![], vec![], vec![row("A", 2017, 1)]).unwrap();
        assert!(FoldPartition::from_table(&table).is_err());
    }

    #[test]
    fn test_fold_with_two_seasons_rejected() {
        let rows = vec![row("A", 2017, 1), row("B", 2018, 1), row("C", 2019, 2)];
        let table = SeasonTable::new(vec![], vec![], rows).unwrap();
        assert!(FoldPartition::from_table(&table).is_err());
    }
}
