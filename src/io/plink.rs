//! Reader for PLINK-style phenotype tables.
//!
//! The first line is a header `FID IID <name>...`; every following line is
//! `<accession> <iid> <value>...`. Columns are separated by single spaces or,
//! if the header does not split on spaces, by tabs. Empty cells and `NaN`
//! are missing values. Underscores in phenotype names become spaces.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlinkError {
    #[error("wrong file format: header must have at least three space or tab separated columns")]
    WrongFormat,

    #[error("file is empty")]
    Empty,

    #[error("line {line}: expected {expected} columns, found {found}")]
    RowLength {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: `{value}` in column {column} is not a number")]
    InvalidValue {
        line: usize,
        column: usize,
        value: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A phenotype matrix: one row per accession, one column per phenotype.
#[derive(Debug, Clone, PartialEq)]
pub struct PlinkTable {
    pub names: Vec<String>,
    pub accession_ids: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl PlinkTable {
    /// Values of one phenotype column, row by row.
    pub fn column(&self, index: usize) -> impl Iterator<Item = Option<f64>> + '_ {
        self.values.iter().map(move |row| row.get(index).copied().flatten())
    }

    /// Number of accessions with a value in the column.
    pub fn observed_count(&self, index: usize) -> usize {
        self.column(index).filter(Option::is_some).count()
    }
}

pub fn parse_plink_file(path: &Path) -> Result<PlinkTable, PlinkError> {
    let file = File::open(path)?;
    parse_plink(BufReader::new(file))
}

pub fn parse_plink<R: BufRead>(reader: R) -> Result<PlinkTable, PlinkError> {
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => line?,
        None => return Err(PlinkError::Empty),
    };
    let header = header.trim_end_matches('\r');

    let delimiter = if header.split(' ').count() > 1 { ' ' } else { '\t' };
    let columns: Vec<&str> = header.split(delimiter).collect();
    if columns.len() < 3 {
        return Err(PlinkError::WrongFormat);
    }
    let names: Vec<String> = columns[2..].iter().map(|s| s.replace('_', " ")).collect();

    let mut accession_ids = Vec::new();
    let mut values = Vec::new();

    for (index, line) in lines {
        let line_no = index + 1;
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let cells: Vec<&str> = line.split(delimiter).collect();
        if cells.len() != columns.len() {
            return Err(PlinkError::RowLength {
                line: line_no,
                expected: columns.len(),
                found: cells.len(),
            });
        }

        let row = cells[2..]
            .iter()
            .enumerate()
            .map(|(i, cell)| parse_value(cell, line_no, i + 3))
            .collect::<Result<Vec<_>, _>>()?;

        accession_ids.push(cells[0].trim().to_string());
        values.push(row);
    }

    tracing::debug!(
        phenotypes = names.len(),
        accessions = accession_ids.len(),
        "parsed PLINK table"
    );

    Ok(PlinkTable {
        names,
        accession_ids,
        values,
    })
}

fn parse_value(cell: &str, line: usize, column: usize) -> Result<Option<f64>, PlinkError> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    let value: f64 = cell.parse().map_err(|_| PlinkError::InvalidValue {
        line,
        column,
        value: cell.to_string(),
    })?;
    Ok((!value.is_nan()).then_some(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_space_delimited_table() {
        let input = "FID IID plant_height flowering_time\n6909 6909 12.5 40\n6910 6910  38\n";
        let table = parse_plink(input.as_bytes()).unwrap();

        assert_eq!(table.names, vec!["plant height", "flowering time"]);
        assert_eq!(table.accession_ids, vec!["6909", "6910"]);
        assert_eq!(table.values[0], vec![Some(12.5), Some(40.0)]);
        assert_eq!(table.values[1], vec![None, Some(38.0)]);
        assert_eq!(table.observed_count(0), 1);
        assert_eq!(table.observed_count(1), 2);
    }

    #[test]
    fn falls_back_to_tabs() {
        let input = "FID\tIID\tleaf_area\n100\t100\t3.25\n101\t101\tNaN\n";
        let table = parse_plink(input.as_bytes()).unwrap();

        assert_eq!(table.names, vec!["leaf area"]);
        assert_eq!(table.column(0).collect::<Vec<_>>(), vec![Some(3.25), None]);
    }

    #[test]
    fn rejects_single_column_header() {
        let err = parse_plink("phenotype\n".as_bytes()).unwrap_err();
        assert!(matches!(err, PlinkError::WrongFormat));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(parse_plink("".as_bytes()), Err(PlinkError::Empty)));
    }

    #[test]
    fn reports_bad_values_with_position() {
        let input = "FID IID height\n1 1 1.0\n2 2 tall\n";
        let err = parse_plink(input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            PlinkError::InvalidValue { line: 3, column: 3, ref value } if value == "tall"
        ));
    }

    #[test]
    fn reports_ragged_rows() {
        let input = "FID IID a b\n1 1 1.0\n";
        let err = parse_plink(input.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            PlinkError::RowLength { line: 2, expected: 4, found: 3 }
        ));
    }
}
