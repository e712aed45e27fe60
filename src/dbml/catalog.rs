use std::collections::HashSet;

use super::scanner::table_names;

/// Names of all tables declared in a document. Membership is exact and case-sensitive.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TableCatalog {
    names: HashSet<String>,
}

impl TableCatalog {
    pub fn from_document(document: &str) -> Self {
        table_names(document).map(String::from).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// The catalog's own copy of `name`, if declared
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl FromIterator<String> for TableCatalog {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for TableCatalog {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(String::from).collect()
    }
}
