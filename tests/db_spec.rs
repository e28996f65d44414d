mod common;

use arapheno::db::Database;
use arapheno::io::plink::PlinkTable;
use arapheno::models::*;
use arapheno::ontology::{self, OntologyStore, Page, SourceField};
use arapheno::OntologyError;
use common::*;
use speculate2::speculate;
use uuid::Uuid;

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "sources" {
        it "returns None for an unknown acronym" {
            let source = db.get_source_by_acronym("PTO").expect("Query failed");
            assert!(source.is_none());
        }

        it "creates and finds a source" {
            let created = db.create_source(CreateSourceInput {
                acronym: "UO".to_string(),
                name: "Unit Ontology".to_string(),
                description: Some("Units of measurement".to_string()),
            }).expect("Failed to create source");

            let found = db.get_source(created.id).expect("Query failed").expect("Missing source");
            assert_eq!(found.acronym, "UO");
            assert_eq!(found.description, Some("Units of measurement".to_string()));
        }

        it "lists sources ordered by acronym" {
            seed_ontologies(&db);

            let sources = db.get_all_sources().expect("Query failed");
            let acronyms: Vec<_> = sources.iter().map(|s| s.acronym.as_str()).collect();
            assert_eq!(acronyms, vec!["PECO", "PTO"]);
        }

        it "cascades deletes to terms" {
            seed_ontologies(&db);
            let source = db.get_source_by_acronym("PTO").unwrap().unwrap();

            assert!(db.delete_source(source.id).expect("Delete failed"));
            assert!(db.get_term(PLANT_TRAIT).unwrap().is_none());
            assert!(db.get_term(GREENHOUSE).unwrap().is_some());
        }
    }

    describe "import_ontology" {
        it "imports terms and links regardless of order" {
            seed_ontologies(&db);

            let source = db.get_source_by_acronym("PTO").unwrap().unwrap();
            assert_eq!(db.get_terms_by_source(source.id).unwrap().len(), 5);

            let parents = db.get_parents(PLANT_HEIGHT).unwrap();
            assert_eq!(parents.len(), 1);
            assert_eq!(parents[0].id, MORPHOLOGY);
        }

        it "reports dangling parent links" {
            let summary = db.import_ontology(
                CreateSourceInput {
                    acronym: "UO".to_string(),
                    name: "Unit Ontology".to_string(),
                    description: None,
                },
                vec![CreateTermInput {
                    id: "UO:0000001".to_string(),
                    name: "length unit".to_string(),
                    definition: None,
                    comment: None,
                    parent_ids: vec!["UO:9999999".to_string()],
                }],
            ).expect("Import failed");

            assert_eq!(summary.terms_imported, 1);
            assert_eq!(summary.links_imported, 0);
            assert_eq!(summary.dangling_links, 1);
            assert!(db.get_parents("UO:0000001").unwrap().is_empty());
        }

        it "updates an existing source in place" {
            seed_ontologies(&db);
            let before = db.get_source_by_acronym("PTO").unwrap().unwrap();
            let tagged = db.create_phenotype(phenotype("Height", Some(PLANT_HEIGHT))).unwrap();

            let summary = db.import_ontology(
                CreateSourceInput {
                    acronym: "PTO".to_string(),
                    name: "Plant Trait Ontology (2024)".to_string(),
                    description: None,
                },
                vec![CreateTermInput {
                    id: PLANT_HEIGHT.to_string(),
                    name: "plant height (renamed)".to_string(),
                    definition: None,
                    comment: None,
                    parent_ids: vec![MORPHOLOGY.to_string()],
                }],
            ).expect("Re-import failed");

            assert_eq!(summary.source.id, before.id);
            assert_eq!(summary.links_imported, 1);
            assert_eq!(db.get_term(PLANT_HEIGHT).unwrap().unwrap().name, "plant height (renamed)");
            let kept = db.get_phenotype(tagged.id).unwrap().unwrap();
            assert_eq!(kept.to_term.as_deref(), Some(PLANT_HEIGHT));
        }

        it "replaces the parents of a moved term" {
            seed_ontologies(&db);
            db.create_phenotype(phenotype("Rosette height", Some(PLANT_HEIGHT))).unwrap();

            db.import_ontology(
                CreateSourceInput {
                    acronym: "PTO".to_string(),
                    name: "Plant Trait Ontology".to_string(),
                    description: None,
                },
                vec![term(PLANT_HEIGHT, "plant height", &[BIOCHEMICAL])],
            ).expect("Re-import failed");

            let parents: Vec<_> = db.get_parents(PLANT_HEIGHT).unwrap().into_iter().map(|t| t.id).collect();
            assert_eq!(parents, vec![BIOCHEMICAL]);
            assert_eq!(ontology::collect_descendants(&db, MORPHOLOGY).unwrap(), vec![MORPHOLOGY]);

            let under_morphology = ontology::phenotypes_for_term(&db, MORPHOLOGY, Page::default()).unwrap();
            assert_eq!(under_morphology.phenotype_count, 0);
            let under_biochemical = ontology::phenotypes_for_term(&db, BIOCHEMICAL, Page::default()).unwrap();
            assert_eq!(under_biochemical.phenotype_count, 1);
        }

        it "does not turn a move back into a cycle" {
            seed_ontologies(&db);
            let pto = || CreateSourceInput {
                acronym: "PTO".to_string(),
                name: "Plant Trait Ontology".to_string(),
                description: None,
            };

            // Release 2 nests morphology under plant height, release 3 reverts it
            db.import_ontology(pto(), vec![
                term(PLANT_HEIGHT, "plant height", &[PLANT_TRAIT]),
                term(MORPHOLOGY, "morphology trait", &[PLANT_HEIGHT]),
            ]).unwrap();
            db.import_ontology(pto(), vec![
                term(MORPHOLOGY, "morphology trait", &[PLANT_TRAIT]),
                term(PLANT_HEIGHT, "plant height", &[MORPHOLOGY]),
            ]).unwrap();

            let ids = ontology::collect_descendants(&db, PLANT_TRAIT).unwrap();
            assert_eq!(ids, vec![PLANT_TRAIT, BIOCHEMICAL, MORPHOLOGY, PLANT_HEIGHT]);
        }
    }

    describe "create_term" {
        it "links a new term under an existing parent" {
            seed_ontologies(&db);
            let source = db.get_source_by_acronym("PTO").unwrap().unwrap();

            db.create_term(source.id, CreateTermInput {
                id: "TO:0000576".to_string(),
                name: "leaf length".to_string(),
                definition: Some("Length of a leaf.".to_string()),
                comment: None,
                parent_ids: vec![MORPHOLOGY.to_string()],
            }).expect("Failed to create term");

            assert_eq!(db.count_children(MORPHOLOGY).unwrap(), 2);
        }

        it "rejects unknown parents" {
            seed_ontologies(&db);
            let source = db.get_source_by_acronym("PTO").unwrap().unwrap();

            let result = db.create_term(source.id, CreateTermInput {
                id: "TO:0000576".to_string(),
                name: "leaf length".to_string(),
                definition: None,
                comment: None,
                parent_ids: vec!["TO:1234567".to_string()],
            });

            assert!(result.is_err());
            assert!(db.get_term("TO:0000576").unwrap().is_none());
        }
    }

    describe "storage_collaborator" {
        it "orders children by name" {
            seed_ontologies(&db);

            let children = db.get_children(PLANT_TRAIT).unwrap();
            let ids: Vec<_> = children.iter().map(|t| t.id.as_str()).collect();
            assert_eq!(ids, vec![BIOCHEMICAL, MORPHOLOGY]);
            assert_eq!(db.count_children(PLANT_TRAIT).unwrap(), 2);
            assert_eq!(db.count_children(PLANT_HEIGHT).unwrap(), 0);
        }

        it "lists only parentless terms as roots" {
            seed_ontologies(&db);
            let source = db.get_source_by_acronym("PTO").unwrap().unwrap();

            let roots = db.root_terms(source.id).unwrap();
            let ids: Vec<_> = roots.iter().map(|t| t.id.as_str()).collect();
            assert_eq!(ids, vec![PLANT_TRAIT, QUALITY]);
        }
    }

    describe "descendants" {
        it "collects the subtree in pre-order" {
            seed_ontologies(&db);

            let ids = ontology::collect_descendants(&db, PLANT_TRAIT).unwrap();
            assert_eq!(ids, vec![PLANT_TRAIT, BIOCHEMICAL, MORPHOLOGY, PLANT_HEIGHT]);
        }

        it "detects cycles stored in the link table" {
            seed_ontologies(&db);
            let source = db.get_source_by_acronym("PTO").unwrap().unwrap();
            db.import_ontology(
                CreateSourceInput {
                    acronym: source.acronym.clone(),
                    name: source.name.clone(),
                    description: None,
                },
                vec![CreateTermInput {
                    id: PLANT_TRAIT.to_string(),
                    name: "plant trait".to_string(),
                    definition: None,
                    comment: None,
                    parent_ids: vec![PLANT_HEIGHT.to_string()],
                }],
            ).unwrap();

            let err = ontology::collect_descendants(&db, MORPHOLOGY).unwrap_err();
            assert!(matches!(err, OntologyError::StructuralCycle { .. }));
        }
    }

    describe "tree_to_root" {
        it "expands the path to the selected term" {
            seed_ontologies(&db);

            let tree = ontology::source_tree(&db, "PTO", Some(PLANT_HEIGHT)).unwrap();
            assert_eq!(tree.len(), 2);

            let root = &tree[0];
            assert_eq!(root.id, PLANT_TRAIT);
            assert!(root.is_opened());

            let level = root.loaded_children();
            assert_eq!(level[0].id, MORPHOLOGY);
            assert_eq!(level[1], TreeNode::stub(BIOCHEMICAL, "biochemical trait", false));

            let target = &level[0].loaded_children()[0];
            assert_eq!(target.id, PLANT_HEIGHT);
            assert!(target.is_selected());

            assert_eq!(tree[1], TreeNode::stub(QUALITY, "quality", false));
        }

        it "lists collapsed roots without a term" {
            seed_ontologies(&db);

            let tree = ontology::source_tree(&db, "PTO", None).unwrap();
            assert_eq!(tree, vec![
                TreeNode::stub(PLANT_TRAIT, "plant trait", true),
                TreeNode::stub(QUALITY, "quality", false),
            ]);
        }
    }

    describe "phenotypes" {
        it "rejects tags from the wrong ontology" {
            seed_ontologies(&db);

            let result = db.create_phenotype(CreatePhenotypeInput {
                name: "Height".to_string(),
                to_term: Some(GREENHOUSE.to_string()),
                ..Default::default()
            });

            let msg = result.unwrap_err().to_string();
            assert!(msg.contains("does not belong"));
        }

        it "rejects unknown terms" {
            seed_ontologies(&db);

            let result = db.create_phenotype(phenotype("Height", Some("TO:7777777")));
            assert!(result.unwrap_err().to_string().contains("not found"));
        }

        it "returns None for a non-existent phenotype" {
            assert!(db.get_phenotype(Uuid::new_v4()).unwrap().is_none());
        }

        it "filters by a term and its descendants" {
            seed_ontologies(&db);
            db.create_phenotype(phenotype("Rosette height", Some(PLANT_HEIGHT))).unwrap();
            db.create_phenotype(phenotype("Anthocyanin", Some(BIOCHEMICAL))).unwrap();
            db.create_phenotype(phenotype("Untagged", None)).unwrap();

            let result = ontology::phenotypes_for_term(&db, MORPHOLOGY, Page::default()).unwrap();
            assert_eq!(result.phenotype_count, 1);
            assert_eq!(result.phenotypes[0].name, "Rosette height");

            let result = ontology::phenotypes_for_term(&db, PLANT_TRAIT, Page::default()).unwrap();
            let names: Vec<_> = result.phenotypes.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["Anthocyanin", "Rosette height"]);
        }

        it "queries long identifier lists in chunks" {
            seed_ontologies(&db);
            db.create_phenotype(phenotype("Rosette height", Some(PLANT_HEIGHT))).unwrap();

            let mut ids: Vec<String> = (0..1200).map(|i| format!("TO:9{:06}", i)).collect();
            ids.push(PLANT_HEIGHT.to_string());

            let found = db.get_phenotypes_by_field(SourceField::ToTerm, &ids).unwrap();
            assert_eq!(found.len(), 1);
        }

        it "fails the filter for sources outside the known ontologies" {
            db.import_ontology(
                CreateSourceInput {
                    acronym: "GO".to_string(),
                    name: "Gene Ontology".to_string(),
                    description: None,
                },
                vec![CreateTermInput {
                    id: "GO:0008150".to_string(),
                    name: "biological process".to_string(),
                    definition: None,
                    comment: None,
                    parent_ids: vec![],
                }],
            ).unwrap();

            let err = ontology::phenotypes_for_term(&db, "GO:0008150", Page::default()).unwrap_err();
            assert!(matches!(err, OntologyError::UnrecognizedSource { acronym } if acronym == "GO"));
        }
    }

    describe "phenotype_pages" {
        it "pages phenotypes in name order" {
            for name in ["Delta", "Alpha", "Charlie", "Bravo"] {
                db.create_phenotype(phenotype(name, None)).unwrap();
            }

            let page = db.get_phenotypes(Page { limit: Some(2), offset: Some(1) }).unwrap();
            let names: Vec<_> = page.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(names, vec!["Bravo", "Charlie"]);
            assert_eq!(db.count_phenotypes().unwrap(), 4);
        }

        it "uses the default page size without a limit" {
            for i in 0..25 {
                db.create_phenotype(phenotype(&format!("Trait {:02}", i), None)).unwrap();
            }

            assert_eq!(db.get_phenotypes(Page::default()).unwrap().len(), ontology::DEFAULT_PAGE_SIZE);
        }
    }

    describe "phenotype_tables" {
        it "stores the measured values of every column" {
            seed_ontologies(&db);
            seed_accessions(&db);
            let table = PlinkTable {
                names: vec!["rosette height".to_string(), "leaf count".to_string()],
                accession_ids: vec!["6909".to_string(), "6910".to_string(), "7000".to_string()],
                values: vec![
                    vec![Some(4.5), Some(11.0)],
                    vec![None, Some(9.0)],
                    vec![Some(5.0), None],
                ],
            };
            let template = CreatePhenotypeInput {
                to_term: Some(PLANT_HEIGHT.to_string()),
                ..Default::default()
            };

            let created = db.import_phenotype_table(&template, &table).expect("Import failed");

            assert_eq!(created.len(), 2);
            assert_eq!(created[0].to_term.as_deref(), Some(PLANT_HEIGHT));
            assert_eq!(created[0].accession_count, 2);

            let values = db.get_phenotype_values(created[0].id).unwrap();
            assert_eq!(values.len(), 2);
            assert_eq!(values[0].accession_id, "6909");
            assert_eq!(values[0].accession_name.as_deref(), Some("Col-0"));
            assert_eq!(values[0].value, 4.5);
            // 7000 was never imported as an accession
            assert_eq!(values[1].accession_id, "7000");
            assert_eq!(values[1].accession_name, None);

            let measured = db.get_accession_values("6910").unwrap();
            assert_eq!(measured.len(), 1);
            assert_eq!(measured[0].phenotype_name, "leaf count");
            assert_eq!(measured[0].value, 9.0);
        }

        it "rolls back every column when one fails" {
            let table = PlinkTable {
                names: vec!["rosette height".to_string(), " ".to_string()],
                accession_ids: vec!["6909".to_string()],
                values: vec![vec![Some(4.5), Some(1.0)]],
            };

            let result = db.import_phenotype_table(&CreatePhenotypeInput::default(), &table);

            assert!(result.is_err());
            assert_eq!(db.count_phenotypes().unwrap(), 0);
        }

        it "rejects repeated accessions" {
            let table = PlinkTable {
                names: vec!["rosette height".to_string()],
                accession_ids: vec!["6909".to_string(), "6909".to_string()],
                values: vec![vec![Some(4.5)], vec![Some(4.7)]],
            };

            let result = db.import_phenotype_table(&CreatePhenotypeInput::default(), &table);

            assert!(result.unwrap_err().to_string().contains("6909"));
            assert_eq!(db.count_phenotypes().unwrap(), 0);
        }

        it "drops values with their phenotype" {
            let table = PlinkTable {
                names: vec!["rosette height".to_string()],
                accession_ids: vec!["6909".to_string()],
                values: vec![vec![Some(4.5)]],
            };
            let created = db.import_phenotype_table(&CreatePhenotypeInput::default(), &table).unwrap();

            assert!(db.delete_phenotype(created[0].id).unwrap());
            assert!(db.get_accession_values("6909").unwrap().is_empty());
        }
    }

    describe "accessions" {
        it "imports and finds accessions" {
            seed_accessions(&db);

            let found = db.get_accession("6909").unwrap().expect("Missing accession");
            assert_eq!(found.name, "Col-0");
            assert_eq!(found.country.as_deref(), Some("United States"));
            assert!(db.get_accession("1").unwrap().is_none());
        }

        it "updates accessions on re-import" {
            seed_accessions(&db);

            db.import_accessions(&[accession("6909", "Col-0", Some("USA"))]).unwrap();

            assert_eq!(db.count_accessions().unwrap(), 2);
            let found = db.get_accession("6909").unwrap().unwrap();
            assert_eq!(found.country.as_deref(), Some("USA"));
        }

        it "pages accessions by name" {
            seed_accessions(&db);

            let page = db.get_accessions(Page { limit: Some(1), offset: Some(1) }).unwrap();
            assert_eq!(page.len(), 1);
            assert_eq!(page[0].name, "Ler-1");
        }
    }
}
