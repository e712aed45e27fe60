//! Foreign-key inference for DBML documents.
//!
//! The document goes through a single forward pass: strip percent signs, collect the declared
//! table names and the relationships that already exist, then walk every field of every table
//! and turn `<something>_id` fields into `Ref:` statements pointing at the table the name
//! refers to. New statements are appended after the original text; nothing already in the
//! document is removed or rewritten.

pub mod catalog;
pub mod reference;
pub mod resolver;
pub mod scanner;

use std::collections::HashSet;

use itertools::Itertools;
use tracing::debug;

pub use catalog::TableCatalog;
pub use reference::{ExistingReferences, GeneratedRelationship, ReferenceKey};
pub use resolver::{resolve, NamingRule, Resolution};

/// Result of running the inference pass over a document
#[derive(Debug, Clone)]
pub struct Augmentation {
    /// Sanitized input with the generated relationships appended
    pub dbml: String,
    pub tables: TableCatalog,
    /// In the order they were appended
    pub generated: Vec<GeneratedRelationship>,
}

/// Infers missing relationships and returns the augmented document.
/// Never fails: input without recognizable tables comes back sanitized and otherwise untouched.
pub fn augment_relationships(raw_schema: &str) -> String {
    augment(raw_schema).dbml
}

pub fn augment(raw_schema: &str) -> Augmentation {
    let document = scanner::sanitize(raw_schema);
    let tables = TableCatalog::from_document(&document);
    let existing = ExistingReferences::from_document(&document);

    debug!(
        "Found {} table(s) and {} existing relationship(s)",
        tables.len(),
        existing.len()
    );

    let generated = synthesize(&document, &tables, &existing);

    let dbml = if generated.is_empty() {
        document
    } else {
        format!(
            "{}\n\n{}",
            document.trim(),
            generated.iter().map(|r| r.to_string()).join("\n")
        )
    };

    Augmentation {
        dbml,
        tables,
        generated,
    }
}

/// Candidate relationships in table-then-field order, minus those already declared
fn synthesize(
    document: &str,
    tables: &TableCatalog,
    existing: &ExistingReferences,
) -> Vec<GeneratedRelationship> {
    let mut emitted = HashSet::new();
    let mut generated = vec![];

    for table in scanner::table_declarations(document) {
        for field in table.fields() {
            let Some(resolution) = resolve(field.name, tables) else {
                continue;
            };

            let relationship = GeneratedRelationship {
                source_table: table.name.to_string(),
                field: field.name.to_string(),
                target_table: resolution.table.to_string(),
            };
            let key = relationship.key();

            if existing.contains(&key) {
                debug!("Skipping {key}: already declared");
                continue;
            }
            // A table declared twice yields the same candidate twice
            if !emitted.insert(key) {
                continue;
            }

            debug!(
                "Inferred {relationship} ({:?}, field type {})",
                resolution.rule, field.data_type
            );
            generated.push(relationship);
        }
    }

    generated
}
