use serde::{Deserialize, Serialize};

/// A natural line (ecotype) that phenotypes are measured on.
///
/// `id` is the numeric stock identifier as text, so it matches the first
/// column of submitted phenotype tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Accession {
    pub id: String,
    pub name: String,
    pub line: Option<String>,
    pub population: Option<String>,
    /// Country name, or the raw code when no country map resolved it.
    pub country: Option<String>,
    pub category: Option<String>,
    pub source: Option<String>,
    pub status: String,
}

/// One measured value of a phenotype.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhenotypeValue {
    pub accession_id: String,
    /// Name of the accession, when it has been imported.
    pub accession_name: Option<String>,
    pub value: f64,
}

/// A phenotype measured on an accession, with the accession's value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessionValue {
    pub phenotype_id: uuid::Uuid,
    pub phenotype_name: String,
    pub value: f64,
}
