//! Ontology tree resolver.
//!
//! Everything here is a read-only traversal over an [`OntologyStore`]:
//!
//! - [`collect_descendants`]: a term plus every term reachable through child
//!   links, used as a filter predicate.
//! - [`build_tree_to_root`]: the tree-widget document with the path from a
//!   root down to a term pre-expanded.
//! - [`SourceField`]: which phenotype field holds the terms of a source.
//! - [`phenotypes_for_term`]: phenotypes tagged with a term or any subterm.

mod ancestry;
mod descendants;
mod filter;
mod render;
mod source_field;

pub use ancestry::*;
pub use descendants::*;
pub use filter::*;
pub use render::*;
pub use source_field::*;

use anyhow::Result;
use uuid::Uuid;

use crate::models::{OntologySource, OntologyTerm};

/// Read access to ontology terms and sources.
///
/// Collections are returned in the store's natural order (term name, then
/// identifier). Traversals rely on that order for their tie-breaks, e.g. the
/// first parent is the one followed when a term has several.
pub trait OntologyStore {
    fn term(&self, id: &str) -> Result<Option<OntologyTerm>>;

    fn parents(&self, id: &str) -> Result<Vec<OntologyTerm>>;

    fn children(&self, id: &str) -> Result<Vec<OntologyTerm>>;

    fn child_count(&self, id: &str) -> Result<usize>;

    fn source(&self, id: Uuid) -> Result<Option<OntologySource>>;

    fn source_by_acronym(&self, acronym: &str) -> Result<Option<OntologySource>>;

    /// Terms of the source that have no parents.
    fn root_terms(&self, source_id: Uuid) -> Result<Vec<OntologyTerm>>;
}
