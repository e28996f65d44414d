use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named controlled vocabulary, e.g. the Plant Trait Ontology.
///
/// Sources own their terms. Root terms are the terms of a source that have
/// no parents.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OntologySource {
    pub id: Uuid,
    /// Short acronym such as `PTO`, `PECO` or `UO`.
    pub acronym: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A single term of an ontology.
///
/// The identifier is the OBO accession (`TO:0000387`), which keeps links
/// stable across re-imports. Parent and child links live in their own table
/// and are resolved through [`crate::ontology::OntologyStore`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OntologyTerm {
    pub id: String,
    pub source_id: Uuid,
    pub name: String,
    pub definition: Option<String>,
    pub comment: Option<String>,
}

/// Input for registering an ontology source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSourceInput {
    pub acronym: String,
    pub name: String,
    pub description: Option<String>,
}

/// Input for inserting a term, including its parent links.
///
/// Parents are referenced by accession and may point at terms inserted
/// later in the same import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTermInput {
    pub id: String,
    pub name: String,
    pub definition: Option<String>,
    pub comment: Option<String>,
    #[serde(default)]
    pub parent_ids: Vec<String>,
}

/// Summary of an ontology import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub source: OntologySource,
    pub terms_imported: usize,
    pub links_imported: usize,
    /// Parent references that did not resolve to a term of any source.
    pub dangling_links: usize,
}
