//! Minimal OBO 1.2 reader.
//!
//! Only `[Term]` stanzas are kept. Within a stanza the reader understands
//! `id`, `name`, `def`, `comment`, `is_a` and `is_obsolete`; other tags are
//! ignored. Typedef and Instance stanzas are skipped entirely.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use crate::models::CreateTermInput;

#[derive(Debug, Error)]
pub enum OboError {
    #[error("line {line}: expected `tag: value`")]
    MalformedLine { line: usize },

    #[error("line {line}: term stanza has no id")]
    MissingId { line: usize },

    #[error("term {id} has no name")]
    MissingName { id: String },

    #[error("line {line}: unterminated quoted string")]
    UnterminatedQuote { line: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A parsed OBO document.
#[derive(Debug, Clone, Default)]
pub struct OboDocument {
    pub format_version: Option<String>,
    /// Value of the `ontology` header tag, e.g. `to`.
    pub ontology: Option<String>,
    pub terms: Vec<OboTerm>,
}

/// A `[Term]` stanza.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OboTerm {
    pub id: String,
    pub name: String,
    pub definition: Option<String>,
    pub comment: Option<String>,
    /// Parent accessions from `is_a` tags.
    pub is_a: Vec<String>,
    pub obsolete: bool,
}

impl OboDocument {
    /// Non-obsolete terms, ready for insertion.
    pub fn into_term_inputs(self) -> Vec<CreateTermInput> {
        self.terms
            .into_iter()
            .filter(|t| !t.obsolete)
            .map(Into::into)
            .collect()
    }
}

impl From<OboTerm> for CreateTermInput {
    fn from(term: OboTerm) -> Self {
        Self {
            id: term.id,
            name: term.name,
            definition: term.definition,
            comment: term.comment,
            parent_ids: term.is_a,
        }
    }
}

enum Section {
    Header,
    Term,
    Other,
}

struct PendingTerm {
    start_line: usize,
    id: Option<String>,
    term: OboTerm,
}

pub fn parse_obo_file(path: &Path) -> Result<OboDocument, OboError> {
    let file = File::open(path)?;
    parse_obo(BufReader::new(file))
}

pub fn parse_obo<R: BufRead>(reader: R) -> Result<OboDocument, OboError> {
    let mut doc = OboDocument::default();
    let mut section = Section::Header;
    let mut pending: Option<PendingTerm> = None;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('!') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            if let Some(done) = pending.take() {
                doc.terms.push(finish_term(done)?);
            }
            section = if line == "[Term]" {
                pending = Some(PendingTerm {
                    start_line: line_no,
                    id: None,
                    term: OboTerm::default(),
                });
                Section::Term
            } else {
                Section::Other
            };
            continue;
        }

        let (tag, value) = line
            .split_once(':')
            .ok_or(OboError::MalformedLine { line: line_no })?;
        let tag = tag.trim();
        let value = value.trim();

        match section {
            Section::Header => match tag {
                "format-version" => doc.format_version = Some(value.to_string()),
                "ontology" => doc.ontology = Some(value.to_string()),
                _ => {}
            },
            Section::Term => {
                if let Some(p) = pending.as_mut() {
                    apply_tag(p, tag, value, line_no)?;
                }
            }
            Section::Other => {}
        }
    }

    if let Some(done) = pending.take() {
        doc.terms.push(finish_term(done)?);
    }

    tracing::debug!(terms = doc.terms.len(), ontology = ?doc.ontology, "parsed OBO document");
    Ok(doc)
}

fn apply_tag(pending: &mut PendingTerm, tag: &str, value: &str, line: usize) -> Result<(), OboError> {
    match tag {
        "id" => pending.id = Some(strip_trailing_comment(value).to_string()),
        "name" => pending.term.name = value.to_string(),
        "def" => pending.term.definition = Some(quoted(value, line)?),
        "comment" => pending.term.comment = Some(value.to_string()),
        "is_a" => pending
            .term
            .is_a
            .push(strip_trailing_comment(value).to_string()),
        "is_obsolete" => pending.term.obsolete = value == "true",
        _ => {}
    }
    Ok(())
}

fn finish_term(pending: PendingTerm) -> Result<OboTerm, OboError> {
    let id = pending.id.ok_or(OboError::MissingId {
        line: pending.start_line,
    })?;
    if pending.term.name.is_empty() {
        return Err(OboError::MissingName { id });
    }
    Ok(OboTerm { id, ..pending.term })
}

/// Drop `! comment` and `{modifier}` suffixes from a reference value.
fn strip_trailing_comment(value: &str) -> &str {
    let end = value.find(['!', '{']).unwrap_or(value.len());
    value[..end].trim()
}

/// Extract the leading quoted string of a `def` value, unescaping `\"` and `\\`.
fn quoted(value: &str, line: usize) -> Result<String, OboError> {
    let Some(rest) = value.strip_prefix('"') else {
        return Ok(value.to_string());
    };

    let mut out = String::new();
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some(escaped) => out.push(escaped),
                None => break,
            },
            '"' => return Ok(out),
            _ => out.push(c),
        }
    }
    Err(OboError::UnterminatedQuote { line })
}
