//! Domain models for AraPheno.
//!
//! # Core Concepts
//!
//! ## Ontologies
//!
//! - [`OntologySource`]: A controlled vocabulary (trait, environment or unit ontology).
//! - [`OntologyTerm`]: A node of a vocabulary. Terms form a DAG through a
//!   many-to-many parent/child relation, so a term may have several parents.
//!
//! ## Phenotypes
//!
//! - [`Phenotype`]: A measured trait, tagged with at most one term per ontology kind.
//! - [`Accession`]: A natural line phenotypes are measured on.
//! - [`PhenotypeValue`]: The value of one phenotype for one accession.
//!
//! ## Wire types
//!
//! - [`TreeNode`]: The document consumed by the front-end tree widget.

mod accession;
mod ontology;
mod phenotype;
mod tree;

pub use accession::*;
pub use ontology::*;
pub use phenotype::*;
pub use tree::*;
