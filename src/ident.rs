//! # Identifier Module
//!
//! Table and column names are interpolated into statement text (values never
//! are), so they form the crate's one trust boundary. [`Ident`] is the only
//! type the statement builders accept for interpolation: constructing one
//! validates the name, making "unvalidated identifier in SQL" unrepresentable.

use crate::error::{DbError, DbResult};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

/// Maximum identifier length in characters
const MAX_IDENT_LEN: usize = 128;

lazy_static! {
    /// Only alphanumeric characters and underscores, must start with letter or underscore
    static ref IDENTIFIER_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();

    /// SQL reserved keywords that cannot be used as identifiers
    static ref RESERVED_KEYWORDS: HashSet<&'static str> = {
        let mut set = HashSet::new();
        set.insert("SELECT");
        set.insert("FROM");
        set.insert("WHERE");
        set.insert("INSERT");
        set.insert("UPDATE");
        set.insert("DELETE");
        set.insert("CREATE");
        set.insert("TABLE");
        set.insert("DROP");
        set.insert("ALTER");
        set.insert("INDEX");
        set.insert("AND");
        set.insert("OR");
        set.insert("NOT");
        set.insert("NULL");
        set.insert("PRIMARY");
        set.insert("KEY");
        set.insert("FOREIGN");
        set.insert("REFERENCES");
        set.insert("UNIQUE");
        set.insert("CHECK");
        set.insert("DEFAULT");
        set.insert("AS");
        set.insert("ORDER");
        set.insert("BY");
        set.insert("GROUP");
        set.insert("HAVING");
        set.insert("LIMIT");
        set.insert("OFFSET");
        set.insert("JOIN");
        set.insert("ON");
        set.insert("CASE");
        set.insert("WHEN");
        set.insert("THEN");
        set.insert("ELSE");
        set.insert("END");
        set.insert("UNION");
        set.insert("ALL");
        set.insert("DISTINCT");
        set.insert("VALUES");
        set.insert("SET");
        set.insert("IN");
        set.insert("BETWEEN");
        set.insert("LIKE");
        set.insert("IS");
        set.insert("EXISTS");
        set
    };
}

/// A validated SQL identifier.
///
/// Rules:
/// - Must match `^[a-zA-Z_][a-zA-Z0-9_]*$`
/// - Must not be a SQL reserved keyword
/// - Maximum length: 128 characters
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    pub fn new(name: &str) -> DbResult<Self> {
        // Length check
        if name.is_empty() || name.len() > MAX_IDENT_LEN {
            return Err(DbError::InvalidIdentifier(format!(
                "identifier '{}' must be 1-{} characters",
                name, MAX_IDENT_LEN
            )));
        }

        // Pattern check
        if !IDENTIFIER_REGEX.is_match(name) {
            return Err(DbError::InvalidIdentifier(format!(
                "identifier '{}' contains invalid characters; use only alphanumerics and underscores, starting with a letter or underscore",
                name
            )));
        }

        // Reserved keyword check
        if RESERVED_KEYWORDS.contains(name.to_uppercase().as_str()) {
            return Err(DbError::InvalidIdentifier(format!(
                "identifier '{}' is a SQL reserved keyword",
                name
            )));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
