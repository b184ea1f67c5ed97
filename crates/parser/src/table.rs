//! Conversion of tabular fixture input into DSL strings.

use crate::ColumnMap;
use common::{FixtureError, FixtureResult};

/// A header row plus data rows, as handed over by a test runner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FixtureTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FixtureTable {
    pub fn new<H, S>(headers: H) -> Self
    where
        H: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_row<R, S>(mut self, row: R) -> Self
    where
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(row.into_iter().map(Into::into).collect());
        self
    }

    /// One DSL string per data row, pairing each cell with its header.
    pub fn to_queries(&self) -> FixtureResult<Vec<String>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                if row.len() != self.headers.len() {
                    return Err(FixtureError::malformed(
                        &row.join("|"),
                        format!(
                            "row {} has {} cells, header has {}",
                            idx + 1,
                            row.len(),
                            self.headers.len()
                        ),
                    ));
                }
                let map: ColumnMap = self.headers.iter().cloned().zip(row.iter().cloned()).collect();
                Ok(map.to_dsl())
            })
            .collect()
    }

    /// Fold a two-column `field | value` table into a single DSL string.
    /// The header row is a label and is not part of the clause.
    pub fn to_single_clause(&self) -> FixtureResult<String> {
        if self.headers.len() != 2 {
            return Err(FixtureError::malformed(
                &self.headers.join("|"),
                "a single-clause table needs exactly two columns",
            ));
        }
        let mut map = ColumnMap::new();
        for row in &self.rows {
            match row.as_slice() {
                [column, value] => map.insert(column.clone(), value.clone()),
                _ => {
                    return Err(FixtureError::malformed(
                        &row.join("|"),
                        "expected a field and a value",
                    ));
                }
            }
        }
        Ok(map.to_dsl())
    }
}
