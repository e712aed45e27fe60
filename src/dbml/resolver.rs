use itertools::Itertools;

use super::catalog::TableCatalog;

const FOREIGN_KEY_SUFFIX: &str = "_id";
const PRIMARY_KEY: &str = "id";

/// Which naming rule matched a field to its table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingRule {
    /// `user_id` -> `user`
    Base,
    /// `user_id` -> `users`
    PluralBase,
    /// `creator_user_id` -> `user` or `users`
    Suffix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub table: &'a str,
    pub rule: NamingRule,
}

/// Candidate table names for a field base, in precedence order. Underscore-separated
/// suffixes of the base are tried from the shortest (rightmost part) to the whole base,
/// each as-is and then pluralized. For a single-part base this is just the base followed
/// by its plural.
///
/// The chain is lazy so resolution stops generating names at the first catalog hit.
fn candidates(base: &str) -> impl Iterator<Item = (NamingRule, String)> + '_ {
    let parts = base.split('_').collect_vec();

    (0..parts.len()).rev().flat_map(move |start| {
        let name = parts[start..].join("_");
        let plural = format!("{name}s");
        if start == 0 {
            [(NamingRule::Base, name), (NamingRule::PluralBase, plural)]
        } else {
            [(NamingRule::Suffix, name), (NamingRule::Suffix, plural)]
        }
    })
}

/// Maps a field name to the table it most likely references, or `None` if the field
/// doesn't look like a foreign key or nothing in the catalog matches.
///
/// The most specific match wins: given tables `user` and `creator_user`,
/// `creator_user_id` resolves to `user`. `creator_user` is only picked when no shorter
/// suffix names a table.
pub fn resolve<'a>(field: &str, catalog: &'a TableCatalog) -> Option<Resolution<'a>> {
    if field == PRIMARY_KEY {
        return None;
    }
    let base = field.strip_suffix(FOREIGN_KEY_SUFFIX)?;
    if base.is_empty() {
        return None;
    }

    candidates(base).find_map(|(rule, candidate)| {
        catalog
            .get(&candidate)
            .map(|table| Resolution { table, rule })
    })
}
