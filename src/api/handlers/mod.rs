use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::Database;
use crate::error::OntologyError;
use crate::models::*;
use crate::ontology::{self, Page};

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
///
/// Validation errors raised by the storage layer (unknown or mismatched
/// ontology terms) are safe to expose and are returned as BAD_REQUEST.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    let msg = e.to_string();

    if msg.contains("not found") || msg.contains("does not belong") {
        tracing::warn!("Validation error: {}", msg);
        return (StatusCode::BAD_REQUEST, msg);
    }

    tracing::error!("Internal error: {}", msg);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn ontology_error(e: OntologyError) -> (StatusCode, String) {
    match e {
        OntologyError::NotFound { .. } => (StatusCode::NOT_FOUND, e.to_string()),
        OntologyError::UnrecognizedSource { .. } => {
            tracing::warn!("{}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        }
        OntologyError::StructuralCycle { .. } => {
            tracing::error!("{}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        OntologyError::Storage(e) => {
            tracing::error!("Internal error: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Ontology sources
// ============================================================

pub async fn list_sources(
    State(db): State<Database>,
) -> Result<Json<Vec<OntologySource>>, (StatusCode, String)> {
    db.get_all_sources().map(Json).map_err(internal_error)
}

pub async fn get_source(
    State(db): State<Database>,
    Path(acronym): Path<String>,
) -> Result<Json<OntologySource>, (StatusCode, String)> {
    db.get_source_by_acronym(&acronym)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Ontology source not found".to_string()))
}

/// Query parameters for the source tree.
#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    /// Term whose path should be expanded and selected.
    pub term_id: Option<String>,
}

/// The tree-widget document for a source.
pub async fn get_source_tree(
    State(db): State<Database>,
    Path(acronym): Path<String>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<Vec<TreeNode>>, (StatusCode, String)> {
    ontology::source_tree(&db, &acronym, query.term_id.as_deref())
        .map(Json)
        .map_err(ontology_error)
}

// ============================================================
// Terms
// ============================================================

pub async fn get_term(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<OntologyTerm>, (StatusCode, String)> {
    db.get_term(&id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Term not found".to_string()))
}

/// Direct children as collapsed nodes, for lazy expansion in the widget.
pub async fn list_term_children(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<Vec<TreeNode>>, (StatusCode, String)> {
    ontology::children_stubs(&db, &id)
        .map(Json)
        .map_err(ontology_error)
}

pub async fn list_term_descendants(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<Vec<String>>, (StatusCode, String)> {
    ontology::collect_descendants(&db, &id)
        .map(Json)
        .map_err(ontology_error)
}

pub async fn list_term_phenotypes(
    State(db): State<Database>,
    Path(id): Path<String>,
    Query(page): Query<Page>,
) -> Result<Json<TermPhenotypes>, (StatusCode, String)> {
    ontology::phenotypes_for_term(&db, &id, page)
        .map(Json)
        .map_err(ontology_error)
}

// ============================================================
// Phenotypes
// ============================================================

/// Header carrying the number of rows before pagination.
const TOTAL_COUNT_HEADER: &str = "x-total-count";

type Paged<T> = ([(&'static str, String); 1], Json<Vec<T>>);

pub async fn list_phenotypes(
    State(db): State<Database>,
    Query(page): Query<Page>,
) -> Result<Paged<Phenotype>, (StatusCode, String)> {
    let total = db.count_phenotypes().map_err(internal_error)?;
    let phenotypes = db.get_phenotypes(page).map_err(internal_error)?;
    Ok(([(TOTAL_COUNT_HEADER, total.to_string())], Json(phenotypes)))
}

pub async fn get_phenotype(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Phenotype>, (StatusCode, String)> {
    db.get_phenotype(id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Phenotype not found".to_string()))
}

pub async fn list_phenotype_values(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<PhenotypeValue>>, (StatusCode, String)> {
    if db.get_phenotype(id).map_err(internal_error)?.is_none() {
        return Err((StatusCode::NOT_FOUND, "Phenotype not found".to_string()));
    }
    db.get_phenotype_values(id).map(Json).map_err(internal_error)
}

pub async fn create_phenotype(
    State(db): State<Database>,
    Json(input): Json<CreatePhenotypeInput>,
) -> Result<(StatusCode, Json<Phenotype>), (StatusCode, String)> {
    if input.name.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Phenotype name must not be empty".to_string(),
        ));
    }

    db.create_phenotype(input)
        .map(|p| (StatusCode::CREATED, Json(p)))
        .map_err(internal_error)
}

pub async fn delete_phenotype(
    State(db): State<Database>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, (StatusCode, String)> {
    if db.delete_phenotype(id).map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Phenotype not found".to_string()))
    }
}

// ============================================================
// Accessions
// ============================================================

pub async fn list_accessions(
    State(db): State<Database>,
    Query(page): Query<Page>,
) -> Result<Paged<Accession>, (StatusCode, String)> {
    let total = db.count_accessions().map_err(internal_error)?;
    let accessions = db.get_accessions(page).map_err(internal_error)?;
    Ok(([(TOTAL_COUNT_HEADER, total.to_string())], Json(accessions)))
}

pub async fn get_accession(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<Accession>, (StatusCode, String)> {
    db.get_accession(&id)
        .map_err(internal_error)?
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Accession not found".to_string()))
}

/// Phenotypes measured on an accession, with the accession's values.
pub async fn list_accession_phenotypes(
    State(db): State<Database>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AccessionValue>>, (StatusCode, String)> {
    if db.get_accession(&id).map_err(internal_error)?.is_none() {
        return Err((StatusCode::NOT_FOUND, "Accession not found".to_string()));
    }
    db.get_accession_values(&id).map(Json).map_err(internal_error)
}
