// Lightweight pattern matching over DBML text. Table bodies are flat (no nested braces), so a
// handful of regular expressions is enough to pull out the structure we care about.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TABLE_NAME: Regex = Regex::new(r#"Table\s+"([^"]+)""#).unwrap();
    // Anything between the name and the opening brace (aliases, settings) is skipped. The
    // brace has to follow on the header line or after nothing but whitespace, otherwise a
    // header without a body would swallow the next table's body.
    static ref TABLE_DECLARATION: Regex =
        Regex::new(r#"Table\s+"([^"]+)"[^{\n]*(?:\n\s*)?\{([^}]*)\}"#).unwrap();
    static ref FIELD_LINE: Regex =
        Regex::new(r#"^\s*"?([A-Za-z0-9_]+)"?\s+(\S+)"#).unwrap();
    static ref REF_STATEMENT: Regex = Regex::new(
        r"Ref\s*:\s*([A-Za-z0-9_]+)\.([A-Za-z0-9_]+)\s*>\s*([A-Za-z0-9_]+)\.([A-Za-z0-9_]+)"
    )
    .unwrap();
}

/// A `Table "<name>" { ... }` block. The body is the raw text between the braces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDeclaration<'a> {
    pub name: &'a str,
    pub body: &'a str,
}

/// One `<name> <type>` line from a table body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldEntry<'a> {
    pub name: &'a str,
    pub data_type: &'a str,
}

/// `Ref: <table>.<field> > <table>.<field>`, split into its four identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefStatement<'a> {
    pub source_table: &'a str,
    pub source_field: &'a str,
    pub target_table: &'a str,
    pub target_field: &'a str,
}

/// Percent signs leak in from the upstream encoding and break the matching below.
pub fn sanitize(document: &str) -> String {
    document.replace('%', "")
}

pub fn table_names(document: &str) -> impl Iterator<Item = &str> {
    TABLE_NAME
        .captures_iter(document)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn table_declarations(document: &str) -> impl Iterator<Item = TableDeclaration<'_>> {
    TABLE_DECLARATION.captures_iter(document).filter_map(|c| {
        Some(TableDeclaration {
            name: c.get(1)?.as_str(),
            body: c.get(2)?.as_str(),
        })
    })
}

impl<'a> TableDeclaration<'a> {
    /// Field lines of the body, in declaration order. Lines that don't start with a
    /// name and a type (blank lines, notes, indexes blocks) are skipped.
    pub fn fields(&self) -> impl Iterator<Item = FieldEntry<'a>> {
        self.body.lines().filter_map(|line| {
            let captures = FIELD_LINE.captures(line)?;
            Some(FieldEntry {
                name: captures.get(1)?.as_str(),
                data_type: captures.get(2)?.as_str(),
            })
        })
    }
}

/// Single-line relationship statements. Composite, multi-line and block forms are not
/// recognized and are left for the caller to treat as opaque text.
pub fn ref_statements(document: &str) -> impl Iterator<Item = RefStatement<'_>> {
    document.lines().filter_map(|line| {
        let captures = REF_STATEMENT.captures(line)?;
        Some(RefStatement {
            source_table: captures.get(1)?.as_str(),
            source_field: captures.get(2)?.as_str(),
            target_table: captures.get(3)?.as_str(),
            target_field: captures.get(4)?.as_str(),
        })
    })
}
