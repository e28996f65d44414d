mod schema;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};
use uuid::Uuid;

use crate::io::plink::PlinkTable;
use crate::models::*;
use crate::ontology::{OntologyStore, Page, PhenotypeStore, SourceField};

/// SQLite keeps the number of bound variables per statement small, so
/// `IN (...)` lists are split into chunks of this size.
const MAX_IN_VARIABLES: usize = 500;

const TERM_COLUMNS: &str = "t.id, t.source_id, t.name, t.definition, t.comment";

const PHENOTYPE_COLUMNS: &str =
    "id, name, scoring, eo_term, to_term, uo_term, accession_count, created_at";

const ACCESSION_COLUMNS: &str = "id, name, line, population, country, category, source, status";

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))
    }

    // ============================================================
    // Ontology sources
    // ============================================================

    pub fn get_all_sources(&self) -> Result<Vec<OntologySource>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, acronym, name, description, created_at
             FROM ontology_sources ORDER BY acronym",
        )?;

        let sources = stmt
            .query_map([], source_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sources)
    }

    pub fn get_source(&self, id: Uuid) -> Result<Option<OntologySource>> {
        let conn = self.lock()?;
        query_source(&conn, "id", &id.to_string())
    }

    pub fn get_source_by_acronym(&self, acronym: &str) -> Result<Option<OntologySource>> {
        let conn = self.lock()?;
        query_source(&conn, "acronym", acronym)
    }

    pub fn create_source(&self, input: CreateSourceInput) -> Result<OntologySource> {
        let conn = self.lock()?;
        insert_source(&conn, input)
    }

    pub fn delete_source(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "DELETE FROM ontology_sources WHERE id = ?",
            [id.to_string()],
        )?;
        Ok(rows > 0)
    }

    // ============================================================
    // Ontology terms
    // ============================================================

    pub fn get_term(&self, id: &str) -> Result<Option<OntologyTerm>> {
        let conn = self.lock()?;
        query_term(&conn, id)
    }

    pub fn get_terms_by_source(&self, source_id: Uuid) -> Result<Vec<OntologyTerm>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TERM_COLUMNS} FROM ontology_terms t
             WHERE t.source_id = ? ORDER BY t.name, t.id"
        ))?;

        let terms = stmt
            .query_map([source_id.to_string()], term_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(terms)
    }

    pub fn get_parents(&self, id: &str) -> Result<Vec<OntologyTerm>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TERM_COLUMNS} FROM ontology_terms t
             JOIN ontology_term_links l ON l.parent_id = t.id
             WHERE l.child_id = ? ORDER BY t.name, t.id"
        ))?;

        let terms = stmt
            .query_map([id], term_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(terms)
    }

    pub fn get_children(&self, id: &str) -> Result<Vec<OntologyTerm>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TERM_COLUMNS} FROM ontology_terms t
             JOIN ontology_term_links l ON l.child_id = t.id
             WHERE l.parent_id = ? ORDER BY t.name, t.id"
        ))?;

        let terms = stmt
            .query_map([id], term_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(terms)
    }

    pub fn count_children(&self, id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM ontology_term_links WHERE parent_id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn get_root_terms(&self, source_id: Uuid) -> Result<Vec<OntologyTerm>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TERM_COLUMNS} FROM ontology_terms t
             WHERE t.source_id = ?
               AND NOT EXISTS (SELECT 1 FROM ontology_term_links l WHERE l.child_id = t.id)
             ORDER BY t.name, t.id"
        ))?;

        let terms = stmt
            .query_map([source_id.to_string()], term_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(terms)
    }

    /// Insert a single term. Every parent must already exist.
    pub fn create_term(&self, source_id: Uuid, input: CreateTermInput) -> Result<OntologyTerm> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if query_source(&tx, "id", &source_id.to_string())?.is_none() {
            bail!("Ontology source not found: {}", source_id);
        }
        for parent_id in &input.parent_ids {
            if query_term(&tx, parent_id)?.is_none() {
                bail!("Parent term not found: {}", parent_id);
            }
        }

        upsert_term(&tx, source_id, &input)?;
        for parent_id in &input.parent_ids {
            insert_link(&tx, parent_id, &input.id)?;
        }
        tx.commit()?;

        Ok(OntologyTerm {
            id: input.id,
            source_id,
            name: input.name,
            definition: input.definition,
            comment: input.comment,
        })
    }

    /// Load a whole ontology in one transaction.
    ///
    /// The source is matched by acronym and created if missing. Terms that
    /// already exist are updated in place so phenotypes keep their tags, and
    /// their parent links are replaced by the ones in `terms`. Parent
    /// references that resolve to no term are skipped and counted.
    pub fn import_ontology(
        &self,
        source: CreateSourceInput,
        terms: Vec<CreateTermInput>,
    ) -> Result<ImportSummary> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let source = match query_source(&tx, "acronym", &source.acronym)? {
            Some(existing) => {
                tx.execute(
                    "UPDATE ontology_sources SET name = ?, description = ? WHERE id = ?",
                    (&source.name, &source.description, existing.id.to_string()),
                )?;
                OntologySource {
                    name: source.name,
                    description: source.description,
                    ..existing
                }
            }
            None => insert_source(&tx, source)?,
        };

        for term in &terms {
            upsert_term(&tx, source.id, term)?;
        }

        // A new release may move terms, so the parent links of every
        // imported term are replaced rather than merged.
        for term in &terms {
            tx.execute(
                "DELETE FROM ontology_term_links WHERE child_id = ?",
                [&term.id],
            )?;
        }

        let imported: HashSet<&str> = terms.iter().map(|t| t.id.as_str()).collect();
        let mut links_imported = 0;
        let mut dangling_links = 0;
        for term in &terms {
            for parent_id in &term.parent_ids {
                if !imported.contains(parent_id.as_str()) && query_term(&tx, parent_id)?.is_none() {
                    tracing::warn!("Skipping link from {} to unknown parent {}", term.id, parent_id);
                    dangling_links += 1;
                    continue;
                }
                links_imported += insert_link(&tx, parent_id, &term.id)?;
            }
        }

        tx.commit()?;

        tracing::info!(
            "Imported {} terms and {} links into {}",
            terms.len(),
            links_imported,
            source.acronym
        );

        Ok(ImportSummary {
            source,
            terms_imported: terms.len(),
            links_imported,
            dangling_links,
        })
    }

    // ============================================================
    // Phenotypes
    // ============================================================

    /// One page of phenotypes ordered by name.
    pub fn get_phenotypes(&self, page: Page) -> Result<Vec<Phenotype>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PHENOTYPE_COLUMNS} FROM phenotypes ORDER BY name, id LIMIT ? OFFSET ?"
        ))?;

        let phenotypes = stmt
            .query_map((page.limit() as i64, page.offset() as i64), phenotype_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(phenotypes)
    }

    pub fn count_phenotypes(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM phenotypes", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn get_phenotype(&self, id: Uuid) -> Result<Option<Phenotype>> {
        let conn = self.lock()?;
        let phenotype = conn
            .query_row(
                &format!("SELECT {PHENOTYPE_COLUMNS} FROM phenotypes WHERE id = ?"),
                [id.to_string()],
                phenotype_from_row,
            )
            .optional()?;
        Ok(phenotype)
    }

    /// Create a phenotype. Each ontology tag must name a term of the matching source.
    pub fn create_phenotype(&self, input: CreatePhenotypeInput) -> Result<Phenotype> {
        let conn = self.lock()?;
        insert_phenotype(&conn, input)
    }

    /// Create one phenotype per column of a PLINK table, with its measured
    /// values, in a single transaction.
    ///
    /// Names and `accession_count` come from the table; the ontology tags and
    /// scoring are taken from `template`.
    pub fn import_phenotype_table(
        &self,
        template: &CreatePhenotypeInput,
        table: &PlinkTable,
    ) -> Result<Vec<Phenotype>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut phenotypes = Vec::with_capacity(table.names.len());
        for (index, name) in table.names.iter().enumerate() {
            if name.trim().is_empty() {
                bail!("Phenotype name in column {} must not be empty", index + 3);
            }

            let phenotype = insert_phenotype(
                &tx,
                CreatePhenotypeInput {
                    name: name.clone(),
                    accession_count: table.observed_count(index) as u32,
                    ..template.clone()
                },
            )?;

            let mut stmt = tx.prepare_cached(
                "INSERT INTO phenotype_values (phenotype_id, accession_id, value) VALUES (?, ?, ?)",
            )?;
            for (accession_id, value) in table.accession_ids.iter().zip(table.column(index)) {
                if let Some(value) = value {
                    stmt.execute((phenotype.id.to_string(), accession_id, value))
                        .with_context(|| {
                            format!("Duplicate value for accession {} in {}", accession_id, name)
                        })?;
                }
            }

            phenotypes.push(phenotype);
        }

        tx.commit()?;

        tracing::info!(
            "Imported {} phenotypes measured on {} accessions",
            phenotypes.len(),
            table.accession_ids.len()
        );
        Ok(phenotypes)
    }

    /// Measured values of a phenotype, ordered by accession name.
    pub fn get_phenotype_values(&self, phenotype_id: Uuid) -> Result<Vec<PhenotypeValue>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT v.accession_id, a.name, v.value FROM phenotype_values v
             LEFT JOIN accessions a ON a.id = v.accession_id
             WHERE v.phenotype_id = ?
             ORDER BY a.name IS NULL, a.name, v.accession_id",
        )?;

        let values = stmt
            .query_map([phenotype_id.to_string()], |row| {
                Ok(PhenotypeValue {
                    accession_id: row.get(0)?,
                    accession_name: row.get(1)?,
                    value: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(values)
    }

    pub fn delete_phenotype(&self, id: Uuid) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM phenotypes WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Phenotypes whose `field` holds one of `term_ids`, ordered by name.
    pub fn get_phenotypes_by_field(
        &self,
        field: SourceField,
        term_ids: &[String],
    ) -> Result<Vec<Phenotype>> {
        let conn = self.lock()?;
        let mut phenotypes = Vec::new();

        for chunk in term_ids.chunks(MAX_IN_VARIABLES) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT {PHENOTYPE_COLUMNS} FROM phenotypes WHERE {} IN ({})",
                field.as_str(),
                placeholders
            ))?;
            let rows = stmt
                .query_map(rusqlite::params_from_iter(chunk.iter()), phenotype_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            phenotypes.extend(rows);
        }

        phenotypes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(phenotypes)
    }

    // ============================================================
    // Accessions
    // ============================================================

    /// Insert or update accessions by id in one transaction.
    pub fn import_accessions(&self, accessions: &[Accession]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO accessions (id, name, line, population, country, category, source, status)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     line = excluded.line,
                     population = excluded.population,
                     country = excluded.country,
                     category = excluded.category,
                     source = excluded.source,
                     status = excluded.status",
            )?;
            for accession in accessions {
                stmt.execute((
                    &accession.id,
                    &accession.name,
                    &accession.line,
                    &accession.population,
                    &accession.country,
                    &accession.category,
                    &accession.source,
                    &accession.status,
                ))?;
            }
        }
        tx.commit()?;

        tracing::info!("Imported {} accessions", accessions.len());
        Ok(accessions.len())
    }

    /// One page of accessions ordered by name.
    pub fn get_accessions(&self, page: Page) -> Result<Vec<Accession>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ACCESSION_COLUMNS} FROM accessions ORDER BY name, id LIMIT ? OFFSET ?"
        ))?;

        let accessions = stmt
            .query_map((page.limit() as i64, page.offset() as i64), accession_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(accessions)
    }

    pub fn count_accessions(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM accessions", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn get_accession(&self, id: &str) -> Result<Option<Accession>> {
        let conn = self.lock()?;
        let accession = conn
            .query_row(
                &format!("SELECT {ACCESSION_COLUMNS} FROM accessions WHERE id = ?"),
                [id],
                accession_from_row,
            )
            .optional()?;
        Ok(accession)
    }

    /// Phenotypes measured on an accession, with its value for each.
    pub fn get_accession_values(&self, accession_id: &str) -> Result<Vec<AccessionValue>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, v.value FROM phenotype_values v
             JOIN phenotypes p ON p.id = v.phenotype_id
             WHERE v.accession_id = ?
             ORDER BY p.name, p.id",
        )?;

        let values = stmt
            .query_map([accession_id], |row| {
                Ok(AccessionValue {
                    phenotype_id: parse_uuid(row.get::<_, String>(0)?),
                    phenotype_name: row.get(1)?,
                    value: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(values)
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

impl OntologyStore for Database {
    fn term(&self, id: &str) -> Result<Option<OntologyTerm>> {
        self.get_term(id)
    }

    fn parents(&self, id: &str) -> Result<Vec<OntologyTerm>> {
        self.get_parents(id)
    }

    fn children(&self, id: &str) -> Result<Vec<OntologyTerm>> {
        self.get_children(id)
    }

    fn child_count(&self, id: &str) -> Result<usize> {
        self.count_children(id)
    }

    fn source(&self, id: Uuid) -> Result<Option<OntologySource>> {
        self.get_source(id)
    }

    fn source_by_acronym(&self, acronym: &str) -> Result<Option<OntologySource>> {
        self.get_source_by_acronym(acronym)
    }

    fn root_terms(&self, source_id: Uuid) -> Result<Vec<OntologyTerm>> {
        self.get_root_terms(source_id)
    }
}

impl PhenotypeStore for Database {
    fn phenotypes_by_field(
        &self,
        field: SourceField,
        term_ids: &[String],
    ) -> Result<Vec<Phenotype>> {
        self.get_phenotypes_by_field(field, term_ids)
    }
}

fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "arapheno")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("arapheno.db"))
}

fn query_source(conn: &Connection, column: &str, value: &str) -> Result<Option<OntologySource>> {
    let source = conn
        .query_row(
            &format!(
                "SELECT id, acronym, name, description, created_at
                 FROM ontology_sources WHERE {column} = ?"
            ),
            [value],
            source_from_row,
        )
        .optional()?;
    Ok(source)
}

fn insert_source(conn: &Connection, input: CreateSourceInput) -> Result<OntologySource> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    conn.execute(
        "INSERT INTO ontology_sources (id, acronym, name, description, created_at)
         VALUES (?, ?, ?, ?, ?)",
        (
            id.to_string(),
            &input.acronym,
            &input.name,
            &input.description,
            now.to_rfc3339(),
        ),
    )
    .with_context(|| format!("Failed to create ontology source {}", input.acronym))?;

    Ok(OntologySource {
        id,
        acronym: input.acronym,
        name: input.name,
        description: input.description,
        created_at: now,
    })
}

fn query_term(conn: &Connection, id: &str) -> Result<Option<OntologyTerm>> {
    let term = conn
        .query_row(
            &format!("SELECT {TERM_COLUMNS} FROM ontology_terms t WHERE t.id = ?"),
            [id],
            term_from_row,
        )
        .optional()?;
    Ok(term)
}

fn upsert_term(conn: &Connection, source_id: Uuid, input: &CreateTermInput) -> Result<()> {
    conn.execute(
        "INSERT INTO ontology_terms (id, source_id, name, definition, comment)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET
             source_id = excluded.source_id,
             name = excluded.name,
             definition = excluded.definition,
             comment = excluded.comment",
        (
            &input.id,
            source_id.to_string(),
            &input.name,
            &input.definition,
            &input.comment,
        ),
    )?;
    Ok(())
}

fn insert_link(conn: &Connection, parent_id: &str, child_id: &str) -> Result<usize> {
    let rows = conn.execute(
        "INSERT OR IGNORE INTO ontology_term_links (parent_id, child_id) VALUES (?, ?)",
        (parent_id, child_id),
    )?;
    Ok(rows)
}

fn insert_phenotype(conn: &Connection, input: CreatePhenotypeInput) -> Result<Phenotype> {
    for (field, term_id) in [
        (SourceField::EoTerm, &input.eo_term),
        (SourceField::ToTerm, &input.to_term),
        (SourceField::UoTerm, &input.uo_term),
    ] {
        if let Some(term_id) = term_id {
            validate_tag(conn, field, term_id)?;
        }
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    conn.execute(
        "INSERT INTO phenotypes (id, name, scoring, eo_term, to_term, uo_term, accession_count, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        (
            id.to_string(),
            &input.name,
            &input.scoring,
            &input.eo_term,
            &input.to_term,
            &input.uo_term,
            input.accession_count,
            now.to_rfc3339(),
        ),
    )?;

    Ok(Phenotype {
        id,
        name: input.name,
        scoring: input.scoring,
        eo_term: input.eo_term,
        to_term: input.to_term,
        uo_term: input.uo_term,
        accession_count: input.accession_count,
        created_at: now,
    })
}

fn validate_tag(conn: &Connection, field: SourceField, term_id: &str) -> Result<()> {
    let acronym: Option<String> = conn
        .query_row(
            "SELECT s.acronym FROM ontology_terms t
             JOIN ontology_sources s ON s.id = t.source_id
             WHERE t.id = ?",
            [term_id],
            |row| row.get(0),
        )
        .optional()?;

    match acronym {
        None => bail!("Term not found: {}", term_id),
        Some(acronym) if acronym != field.acronym() => bail!(
            "Term {} does not belong to {}, the ontology of {}",
            term_id,
            field.acronym(),
            field.as_str()
        ),
        Some(_) => Ok(()),
    }
}

fn source_from_row(row: &Row) -> rusqlite::Result<OntologySource> {
    Ok(OntologySource {
        id: parse_uuid(row.get::<_, String>(0)?),
        acronym: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

fn term_from_row(row: &Row) -> rusqlite::Result<OntologyTerm> {
    Ok(OntologyTerm {
        id: row.get(0)?,
        source_id: parse_uuid(row.get::<_, String>(1)?),
        name: row.get(2)?,
        definition: row.get(3)?,
        comment: row.get(4)?,
    })
}

fn phenotype_from_row(row: &Row) -> rusqlite::Result<Phenotype> {
    Ok(Phenotype {
        id: parse_uuid(row.get::<_, String>(0)?),
        name: row.get(1)?,
        scoring: row.get(2)?,
        eo_term: row.get(3)?,
        to_term: row.get(4)?,
        uo_term: row.get(5)?,
        accession_count: row.get(6)?,
        created_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn accession_from_row(row: &Row) -> rusqlite::Result<Accession> {
    Ok(Accession {
        id: row.get(0)?,
        name: row.get(1)?,
        line: row.get(2)?,
        population: row.get(3)?,
        country: row.get(4)?,
        category: row.get(5)?,
        source: row.get(6)?,
        status: row.get(7)?,
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
