//! Parsers for the files AraPheno ingests.
//!
//! - [`obo`]: OBO 1.2 ontology files, the import format of all three ontologies.
//! - [`plink`]: PLINK-style phenotype tables submitted by researchers.
//! - [`accessions`]: accession master tables and country-code CSVs.

pub mod accessions;
pub mod obo;
pub mod plink;
