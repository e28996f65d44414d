//! AraPheno ontology service.
//!
//! Phenotypes in the catalog are tagged with terms of three ontologies
//! (experimental conditions, traits and units). This crate stores those
//! ontologies, resolves their term hierarchies for the tree widget and for
//! phenotype filtering, and serves both over HTTP.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod io;
pub mod models;
pub mod ontology;

pub use error::{OntologyError, OntologyResult};
