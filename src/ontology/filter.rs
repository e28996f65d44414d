use std::collections::HashSet;

use anyhow::Result;
use serde::Deserialize;

use super::{collect_descendants, OntologyStore, SourceField};
use crate::error::{OntologyError, OntologyResult};
use crate::models::{Phenotype, TermPhenotypes};

/// Page size used when the caller does not pass a limit.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Lookup of phenotypes by ontology field.
pub trait PhenotypeStore {
    /// Phenotypes whose `field` holds one of `term_ids`, ordered by name.
    fn phenotypes_by_field(&self, field: SourceField, term_ids: &[String])
        -> Result<Vec<Phenotype>>;
}

/// Pagination parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Page {
    pub fn limit(&self) -> usize {
        self.limit.map(|l| l as usize).unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0) as usize
    }

    /// Paginate a list that is already in memory.
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.limit())
            .collect()
    }
}

/// Phenotypes tagged with `term_id` or any of its descendants.
///
/// The source of the term decides which phenotype field is searched; a source
/// outside the known ontologies fails with `UnrecognizedSource`.
pub fn phenotypes_for_term<S>(store: &S, term_id: &str, page: Page) -> OntologyResult<TermPhenotypes>
where
    S: OntologyStore + PhenotypeStore + ?Sized,
{
    let term = store
        .term(term_id)?
        .ok_or_else(|| OntologyError::term_not_found(term_id))?;
    let source = store
        .source(term.source_id)?
        .ok_or_else(|| OntologyError::source_not_found(term.source_id.to_string()))?;
    let field = SourceField::from_acronym(&source.acronym)?;

    // Terms reachable through several parents are listed more than once.
    let mut seen = HashSet::new();
    let ids: Vec<String> = collect_descendants(store, &term.id)?
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let phenotypes = store.phenotypes_by_field(field, &ids)?;
    tracing::debug!(
        term = %term.id,
        field = field.as_str(),
        terms = ids.len(),
        matches = phenotypes.len(),
        "filtered phenotypes by term"
    );

    Ok(TermPhenotypes {
        term,
        phenotype_count: phenotypes.len(),
        phenotypes: page.apply(phenotypes),
    })
}
