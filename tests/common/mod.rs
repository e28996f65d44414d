#![allow(dead_code)]

use arapheno::db::Database;
use arapheno::models::*;

pub const PLANT_TRAIT: &str = "TO:0000387";
pub const MORPHOLOGY: &str = "TO:0000017";
pub const PLANT_HEIGHT: &str = "TO:0000207";
pub const BIOCHEMICAL: &str = "TO:0000277";
pub const QUALITY: &str = "TO:0000500";
pub const GREENHOUSE: &str = "PECO:0007248";

pub fn term(id: &str, name: &str, parents: &[&str]) -> CreateTermInput {
    CreateTermInput {
        id: id.to_string(),
        name: name.to_string(),
        definition: None,
        comment: None,
        parent_ids: parents.iter().map(|p| p.to_string()).collect(),
    }
}

/// Trait ontology:
///
/// ```text
/// plant trait
/// ├── biochemical trait
/// └── morphology trait
///     └── plant height
/// quality
/// ```
///
/// plus a one-term environment ontology.
pub fn seed_ontologies(db: &Database) {
    db.import_ontology(
        CreateSourceInput {
            acronym: "PTO".to_string(),
            name: "Plant Trait Ontology".to_string(),
            description: None,
        },
        vec![
            term(PLANT_HEIGHT, "plant height", &[MORPHOLOGY]),
            term(PLANT_TRAIT, "plant trait", &[]),
            term(MORPHOLOGY, "morphology trait", &[PLANT_TRAIT]),
            term(BIOCHEMICAL, "biochemical trait", &[PLANT_TRAIT]),
            term(QUALITY, "quality", &[]),
        ],
    )
    .expect("Failed to import PTO");

    db.import_ontology(
        CreateSourceInput {
            acronym: "PECO".to_string(),
            name: "Plant Experimental Conditions Ontology".to_string(),
            description: None,
        },
        vec![term(GREENHOUSE, "greenhouse study", &[])],
    )
    .expect("Failed to import PECO");
}

pub fn phenotype(name: &str, to_term: Option<&str>) -> CreatePhenotypeInput {
    CreatePhenotypeInput {
        name: name.to_string(),
        to_term: to_term.map(str::to_string),
        ..Default::default()
    }
}

pub fn accession(id: &str, name: &str, country: Option<&str>) -> Accession {
    Accession {
        id: id.to_string(),
        name: name.to_string(),
        line: None,
        population: None,
        country: country.map(str::to_string),
        category: None,
        source: None,
        status: "active".to_string(),
    }
}

/// Two accessions, `6909` (Col-0) and `6910` (Ler-1).
pub fn seed_accessions(db: &Database) {
    db.import_accessions(&[
        accession("6909", "Col-0", Some("United States")),
        accession("6910", "Ler-1", Some("Germany")),
    ])
    .expect("Failed to import accessions");
}
