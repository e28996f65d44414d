//! Errors raised by the ontology resolver.
//!
//! Storage and import plumbing report through `anyhow`; the resolver wraps
//! those failures in [`OntologyError::Storage`] so callers can still match
//! on the conditions they surface to users.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OntologyError {
    /// The acronym does not name one of the environment, trait or unit ontologies.
    #[error("Unrecognized ontology source: {acronym}")]
    UnrecognizedSource { acronym: String },

    /// A term or source lookup returned no result.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The parent/child links loop back onto a term already on the current path.
    #[error("Ontology structure contains a cycle through term {term}")]
    StructuralCycle { term: String },

    /// The storage collaborator failed.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl OntologyError {
    pub fn term_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Term",
            id: id.into(),
        }
    }

    pub fn source_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Ontology source",
            id: id.into(),
        }
    }
}

pub type OntologyResult<T> = std::result::Result<T, OntologyError>;
