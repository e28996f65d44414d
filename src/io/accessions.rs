//! Readers for accession master tables and country-code maps.
//!
//! An accession table is tab separated with the fixed header
//! `name line population country category source status`. The accession id
//! is the name without its `HM` stock prefix, e.g. `HM6909` becomes `6909`.
//!
//! A country map is a CSV file with a header row. One column holds the code
//! (ISO 3166-1 alpha-3 by default) and the `name` column the country name.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::models::Accession;

pub const ACCESSION_HEADER: [&str; 7] = [
    "name",
    "line",
    "population",
    "country",
    "category",
    "source",
    "status",
];

pub const DEFAULT_COUNTRY_KEY: &str = "ISO3166-1-Alpha-3";

#[derive(Debug, Error)]
pub enum AccessionError {
    #[error("header must be `{}`, found `{found}`", ACCESSION_HEADER.join(" "))]
    Header { found: String },

    #[error("file is empty")]
    Empty,

    #[error("line {line}: accession has no status")]
    MissingStatus { line: usize },

    #[error("line {line}: `{name}` is not a numeric accession name")]
    InvalidId { line: usize, name: String },

    #[error("country map has no `{column}` column")]
    MissingColumn { column: String },

    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A row of an accession table, before country resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessionRecord {
    pub id: String,
    pub name: String,
    pub line: Option<String>,
    pub population: Option<String>,
    pub country: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub status: String,
}

impl AccessionRecord {
    /// Resolve the country code through `countries`, keeping the raw code
    /// when the map has no entry for it.
    pub fn into_accession(self, countries: &CountryMap) -> Accession {
        let country = self.country.map(|code| countries.resolve(&code).to_string());
        Accession {
            id: self.id,
            name: self.name,
            line: self.line,
            population: self.population,
            country,
            category: self.category,
            source: self.source,
            status: self.status,
        }
    }
}

/// Country code to country name.
#[derive(Debug, Clone, Default)]
pub struct CountryMap {
    names: HashMap<String, String>,
}

impl CountryMap {
    pub fn resolve<'a>(&'a self, code: &'a str) -> &'a str {
        self.names.get(code).map(String::as_str).unwrap_or(code)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub fn parse_accession_file(path: &Path) -> Result<Vec<AccessionRecord>, AccessionError> {
    let file = File::open(path)?;
    parse_accessions(BufReader::new(file))
}

pub fn parse_accessions<R: BufRead>(reader: R) -> Result<Vec<AccessionRecord>, AccessionError> {
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => line?,
        None => return Err(AccessionError::Empty),
    };
    let header = header.trim_end_matches('\r');
    if !header.split('\t').eq(ACCESSION_HEADER) {
        return Err(AccessionError::Header {
            found: header.to_string(),
        });
    }

    let mut records = Vec::new();
    for (index, line) in lines {
        let line_no = index + 1;
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let cells: Vec<&str> = line.split('\t').collect();
        let cell = |i: usize| {
            cells
                .get(i)
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(str::to_string)
        };

        let name = cells[0].trim().to_string();
        let id = name
            .trim_start_matches(['H', 'M'])
            .parse::<u64>()
            .map_err(|_| AccessionError::InvalidId {
                line: line_no,
                name: name.clone(),
            })?;
        let status = cell(6).ok_or(AccessionError::MissingStatus { line: line_no })?;

        records.push(AccessionRecord {
            id: id.to_string(),
            name,
            line: cell(1),
            population: cell(2),
            country: cell(3),
            category: cell(4),
            source: cell(5),
            status,
        });
    }

    tracing::debug!(accessions = records.len(), "parsed accession table");
    Ok(records)
}

pub fn parse_country_map_file(path: &Path, key: &str) -> Result<CountryMap, AccessionError> {
    let file = File::open(path)?;
    parse_country_map(BufReader::new(file), key)
}

/// Read a country-code CSV, keyed by the `key` column.
pub fn parse_country_map<R: BufRead>(reader: R, key: &str) -> Result<CountryMap, AccessionError> {
    let mut lines = reader.lines().enumerate();

    let header = match lines.next() {
        Some((_, line)) => split_csv_line(line?.trim_end_matches('\r'), 1)?,
        None => return Err(AccessionError::Empty),
    };
    let column = |name: &str| {
        header
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AccessionError::MissingColumn {
                column: name.to_string(),
            })
    };
    let key_index = column(key)?;
    let name_index = column("name")?;

    let mut names = HashMap::new();
    for (index, line) in lines {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_csv_line(line, index + 1)?;
        if let (Some(code), Some(name)) = (fields.get(key_index), fields.get(name_index)) {
            if !code.is_empty() {
                names.insert(code.clone(), name.clone());
            }
        }
    }

    tracing::debug!(countries = names.len(), key, "parsed country map");
    Ok(CountryMap { names })
}

/// Split one CSV record. Fields may be double-quoted; `""` inside quotes is
/// a literal quote.
fn split_csv_line(line: &str, line_no: usize) -> Result<Vec<String>, AccessionError> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, in_quotes) {
            ('"', true) if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            ('"', true) => in_quotes = false,
            ('"', false) if field.is_empty() => in_quotes = true,
            (',', false) => fields.push(std::mem::take(&mut field)),
            (c, _) => field.push(c),
        }
    }
    if in_quotes {
        return Err(AccessionError::UnterminatedQuote { line: line_no });
    }
    fields.push(field);

    Ok(fields)
}
