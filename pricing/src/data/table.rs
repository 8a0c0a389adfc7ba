// BSD 3-Clause License
//
// Copyright (c) 2025, BlackPortal ○
//
// Redistribution and use in source and binary forms, with or without
// modification, are permitted provided that the following conditions are met:
//
// 1. Redistributions of source code must retain the above copyright notice, this
//    list of conditions and the following disclaimer.
//
// 2. Redistributions in binary form must reproduce the above copyright notice,
//    this list of conditions and the following disclaimer in the documentation
//    and/or other materials provided with the distribution.
//
// 3. Neither the name of the copyright holder nor the names of its
//    contributors may be used to endorse or promote products derived from
//    this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use std::collections::HashSet;

use ndarray::{Array1, Array2, ArrayView1, Axis, concatenate};

use crate::errors::SchemaError;

/// A numeric matrix with one unique name per column.
///
/// Rows are samples. Column order is significant: models trained on a table expect
/// every later table to present the same names in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl Table {
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self, SchemaError> {
        if columns.len() != values.ncols() {
            return Err(SchemaError::ColumnCount { expected: columns.len(), actual: values.ncols() });
        }
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateColumn(name.clone()));
            }
        }
        Ok(Table { columns, values })
    }

    /// Builds a table from named columns of equal length.
    pub fn from_columns(columns: Vec<(String, Array1<f64>)>) -> Result<Self, SchemaError> {
        let n_rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut values = Array2::zeros((n_rows, columns.len()));
        let mut names = Vec::with_capacity(columns.len());
        for (j, (name, column)) in columns.into_iter().enumerate() {
            if column.len() != n_rows {
                return Err(SchemaError::RowCount { expected: n_rows, actual: column.len() });
            }
            values.column_mut(j).assign(&column);
            names.push(name);
        }
        Table::new(names, values)
    }

    /// A one-row table, the shape used for single-listing inference.
    pub fn single_row(columns: Vec<String>, row: Vec<f64>) -> Result<Self, SchemaError> {
        let n = row.len();
        let values = Array2::from_shape_vec((1, n), row)
            .map_err(|_| SchemaError::ColumnCount { expected: columns.len(), actual: n })?;
        Table::new(columns, values)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column(&self, name: &str) -> Result<ArrayView1<'_, f64>, SchemaError> {
        let j = self.column_index(name).ok_or_else(|| SchemaError::MissingColumn(name.to_string()))?;
        Ok(self.values.column(j))
    }

    /// Appends a column at the right edge.
    pub fn push_column(&mut self, name: &str, column: Array1<f64>) -> Result<(), SchemaError> {
        if self.has_column(name) {
            return Err(SchemaError::DuplicateColumn(name.to_string()));
        }
        if column.len() != self.nrows() {
            return Err(SchemaError::RowCount { expected: self.nrows(), actual: column.len() });
        }
        let n_rows = self.nrows();
        let column = column.insert_axis(Axis(1));
        let merged = concatenate(Axis(1), &[self.values.view(), column.view()])
            .map_err(|_| SchemaError::RowCount { expected: n_rows, actual: column.nrows() })?;
        self.values = merged;
        self.columns.push(name.to_string());
        Ok(())
    }

    /// Overwrites an existing column in place, keeping its position.
    pub fn replace_column(&mut self, name: &str, column: Array1<f64>) -> Result<(), SchemaError> {
        let j = self.column_index(name).ok_or_else(|| SchemaError::MissingColumn(name.to_string()))?;
        if column.len() != self.nrows() {
            return Err(SchemaError::RowCount { expected: self.nrows(), actual: column.len() });
        }
        self.values.column_mut(j).assign(&column);
        Ok(())
    }

    /// Returns a copy without the named columns. Every name must exist.
    pub fn drop_columns(&self, names: &[&str]) -> Result<Table, SchemaError> {
        for name in names {
            if !self.has_column(name) {
                return Err(SchemaError::MissingColumn(name.to_string()));
            }
        }
        let keep: Vec<usize> =
            (0..self.ncols()).filter(|&j| !names.contains(&self.columns[j].as_str())).collect();
        Ok(Table {
            columns: keep.iter().map(|&j| self.columns[j].clone()).collect(),
            values: self.values.select(Axis(1), &keep),
        })
    }

    /// Returns a copy restricted to `rows`, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table { columns: self.columns.clone(), values: self.values.select(Axis(0), rows) }
    }

    /// Checks that this table has exactly `expected` as its columns, in order.
    pub fn ensure_columns(&self, expected: &[String]) -> Result<(), SchemaError> {
        let actual: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        let wanted: HashSet<&str> = expected.iter().map(String::as_str).collect();
        if let Some(missing) = expected.iter().find(|c| !actual.contains(c.as_str())) {
            return Err(SchemaError::MissingColumn(missing.clone()));
        }
        if let Some(extra) = self.columns.iter().find(|c| !wanted.contains(c.as_str())) {
            return Err(SchemaError::UnexpectedColumn(extra.clone()));
        }
        for (position, (expected, found)) in expected.iter().zip(self.columns.iter()).enumerate() {
            if expected != found {
                return Err(SchemaError::ColumnOrder {
                    position,
                    expected: expected.clone(),
                    found: found.clone(),
                });
            }
        }
        Ok(())
    }
}
