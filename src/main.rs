use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arapheno::{api, config::ServerConfig, db, io, models, ontology};

#[derive(Parser)]
#[command(name = "arapheno")]
#[command(about = "Phenotype catalog ontology service")]
struct Cli {
    /// Database file (overrides config and ARAPHENO_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Import an OBO ontology file
    ImportObo {
        file: PathBuf,
        /// Source acronym, e.g. PTO, PECO or UO
        #[arg(long)]
        acronym: String,
        /// Full source name
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Import a PLINK phenotype file, one phenotype per column
    ImportPhenotypes {
        file: PathBuf,
        /// Trait ontology term for every imported phenotype
        #[arg(long)]
        to_term: Option<String>,
        /// Environment ontology term for every imported phenotype
        #[arg(long)]
        eo_term: Option<String>,
        /// Unit ontology term for every imported phenotype
        #[arg(long)]
        uo_term: Option<String>,
        /// How the phenotypes were scored
        #[arg(long)]
        scoring: Option<String>,
    },
    /// Import an accession master table
    ImportAccessions {
        file: PathBuf,
        /// Country-code CSV used to resolve the country column
        #[arg(long)]
        countries: Option<PathBuf>,
        /// Column of the country CSV holding the codes
        #[arg(long, default_value = io::accessions::DEFAULT_COUNTRY_KEY)]
        country_key: String,
    },
    /// Print the tree of a source, optionally expanded to a term
    Tree {
        acronym: String,
        #[arg(long)]
        term: Option<String>,
    },
    /// Print a term and all of its descendants
    Descendants { term: String },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "arapheno=debug,tower_http=debug".into()),
    );

    // stdout is reserved for command output
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_database(config: &ServerConfig) -> anyhow::Result<db::Database> {
    let db = match &config.db_path {
        Some(path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;
    Ok(db)
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let db = open_database(&config)?;
    let app = api::create_router_with_config(db, &config);

    let address = config.address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("AraPheno server listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = ServerConfig::load();
    if let Some(path) = cli.db {
        config.db_path = Some(path);
    }

    match cli.command {
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await?;
        }
        Some(Commands::ImportObo {
            file,
            acronym,
            name,
            description,
        }) => {
            let db = open_database(&config)?;
            let document = io::obo::parse_obo_file(&file)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            let summary = db.import_ontology(
                models::CreateSourceInput {
                    acronym,
                    name,
                    description,
                },
                document.into_term_inputs(),
            )?;
            println!(
                "Imported {} terms and {} links into {} ({} dangling links skipped)",
                summary.terms_imported,
                summary.links_imported,
                summary.source.acronym,
                summary.dangling_links
            );
        }
        Some(Commands::ImportPhenotypes {
            file,
            to_term,
            eo_term,
            uo_term,
            scoring,
        }) => {
            let db = open_database(&config)?;
            let table = io::plink::parse_plink_file(&file)
                .with_context(|| format!("Failed to parse {}", file.display()))?;
            let template = models::CreatePhenotypeInput {
                scoring,
                eo_term,
                to_term,
                uo_term,
                ..Default::default()
            };
            for phenotype in db.import_phenotype_table(&template, &table)? {
                println!(
                    "{}\t{}\t{} values",
                    phenotype.id, phenotype.name, phenotype.accession_count
                );
            }
        }
        Some(Commands::ImportAccessions {
            file,
            countries,
            country_key,
        }) => {
            let db = open_database(&config)?;
            let countries = match countries {
                Some(path) => io::accessions::parse_country_map_file(&path, &country_key)
                    .with_context(|| format!("Failed to parse {}", path.display()))?,
                None => io::accessions::CountryMap::default(),
            };
            let accessions: Vec<_> = io::accessions::parse_accession_file(&file)
                .with_context(|| format!("Failed to parse {}", file.display()))?
                .into_iter()
                .map(|record| record.into_accession(&countries))
                .collect();
            let imported = db.import_accessions(&accessions)?;
            println!("Imported {} accessions", imported);
        }
        Some(Commands::Tree { acronym, term }) => {
            let db = open_database(&config)?;
            let tree = ontology::source_tree(&db, &acronym, term.as_deref())?;
            print!("{}", ontology::render_tree(&tree));
        }
        Some(Commands::Descendants { term }) => {
            let db = open_database(&config)?;
            for id in ontology::collect_descendants(&db, &term)? {
                println!("{}", id);
            }
        }
        None => serve(config).await?,
    }

    Ok(())
}
