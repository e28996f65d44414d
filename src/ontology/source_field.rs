use serde::{Deserialize, Serialize};

use crate::error::{OntologyError, OntologyResult};

/// The phenotype field that holds terms of a given ontology source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceField {
    /// Plant Experimental Conditions Ontology.
    EoTerm,
    /// Plant Trait Ontology.
    ToTerm,
    /// Units of measurement Ontology.
    UoTerm,
}

const SOURCE_FIELDS: &[(&str, SourceField)] = &[
    ("PECO", SourceField::EoTerm),
    ("PTO", SourceField::ToTerm),
    ("UO", SourceField::UoTerm),
];

impl SourceField {
    pub const ALL: [SourceField; 3] = [Self::EoTerm, Self::ToTerm, Self::UoTerm];

    /// Map a source acronym to its field. Acronyms are matched exactly.
    pub fn from_acronym(acronym: &str) -> OntologyResult<Self> {
        SOURCE_FIELDS
            .iter()
            .find(|(known, _)| *known == acronym)
            .map(|(_, field)| *field)
            .ok_or_else(|| OntologyError::UnrecognizedSource {
                acronym: acronym.to_string(),
            })
    }

    pub fn acronym(&self) -> &'static str {
        match self {
            Self::EoTerm => "PECO",
            Self::ToTerm => "PTO",
            Self::UoTerm => "UO",
        }
    }

    /// Column name in the `phenotypes` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EoTerm => "eo_term",
            Self::ToTerm => "to_term",
            Self::UoTerm => "uo_term",
        }
    }
}
