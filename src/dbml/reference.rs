use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

use super::scanner::ref_statements;

/// Primary key column every generated relationship points at. The upstream extractor always
/// names primary keys `id`, so deduplication only needs to consider that target column.
pub const TARGET_FIELD: &str = "id";

/// Identity of a relationship, used only for deduplication.
/// Renders as `<table>.<field>-<table>.<field>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceKey {
    pub source_table: String,
    pub source_field: String,
    pub target_table: String,
    pub target_field: String,
}

impl Display for ReferenceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}-{}.{}",
            self.source_table, self.source_field, self.target_table, self.target_field
        )
    }
}

/// Relationships already declared in the document
#[derive(Debug, Default, Clone)]
pub struct ExistingReferences {
    keys: HashSet<ReferenceKey>,
}

impl ExistingReferences {
    pub fn from_document(document: &str) -> Self {
        let keys = ref_statements(document)
            .map(|r| ReferenceKey {
                source_table: r.source_table.to_string(),
                source_field: r.source_field.to_string(),
                target_table: r.target_table.to_string(),
                target_field: r.target_field.to_string(),
            })
            .collect();
        Self { keys }
    }

    pub fn contains(&self, key: &ReferenceKey) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// An inferred foreign key from `source_table.field` to `target_table.id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedRelationship {
    pub source_table: String,
    pub field: String,
    pub target_table: String,
}

impl GeneratedRelationship {
    pub fn key(&self) -> ReferenceKey {
        ReferenceKey {
            source_table: self.source_table.clone(),
            source_field: self.field.clone(),
            target_table: self.target_table.clone(),
            target_field: TARGET_FIELD.to_string(),
        }
    }
}

impl Display for GeneratedRelationship {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ref: {}.{} > {}.{}",
            self.source_table, self.field, self.target_table, TARGET_FIELD
        )
    }
}
