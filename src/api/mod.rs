mod handlers;

use axum::{
    http::{HeaderName, HeaderValue, Method},
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::db::Database;

pub fn create_router(db: Database) -> Router {
    create_router_with_config(db, &ServerConfig::default())
}

pub fn create_router_with_config(db: Database, config: &ServerConfig) -> Router {
    let api = Router::new()
        // Ontology sources
        .route("/ontologies", get(handlers::list_sources))
        .route("/ontologies/{acronym}", get(handlers::get_source))
        .route("/ontologies/{acronym}/tree", get(handlers::get_source_tree))
        // Terms
        .route("/terms/{id}", get(handlers::get_term))
        .route("/terms/{id}/children", get(handlers::list_term_children))
        .route("/terms/{id}/descendants", get(handlers::list_term_descendants))
        .route("/terms/{id}/phenotypes", get(handlers::list_term_phenotypes))
        // Phenotypes
        .route(
            "/phenotypes",
            get(handlers::list_phenotypes).post(handlers::create_phenotype),
        )
        .route(
            "/phenotypes/{id}",
            get(handlers::get_phenotype).delete(handlers::delete_phenotype),
        )
        .route("/phenotypes/{id}/values", get(handlers::list_phenotype_values))
        // Accessions
        .route("/accessions", get(handlers::list_accessions))
        .route("/accessions/{id}", get(handlers::get_accession))
        .route(
            "/accessions/{id}/phenotypes",
            get(handlers::list_accession_phenotypes),
        )
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(config)),
        )
        .with_state(db)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let Some(origins) = &config.cors_origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static("x-total-count")])
}
