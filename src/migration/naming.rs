//! Migration names and SQL identifier checks
//!
//! Generated migrations are named `m{YYYYMMDDHHMMSS}_{slug}`, so sorting names
//! lexicographically sorts them by creation time.

use super::error::MigrationError;
use chrono::{DateTime, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Longest name the ledger's `name` column accepts.
pub const MAX_NAME_LEN: usize = 255;

static NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^m(\d{14})_([a-z0-9_]+)$").expect("valid migration name regex"));

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}(\.[A-Za-z_][A-Za-z0-9_]{0,62})?$")
        .expect("valid identifier regex")
});

/// A parsed timestamp-prefixed migration name
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MigrationName {
    /// Version (timestamp: YYYYMMDDHHMMSS)
    pub version: i64,
    /// Snake-case description
    pub slug: String,
}

impl MigrationName {
    /// Parse `m{YYYYMMDDHHMMSS}_{slug}`
    ///
    /// # Example
    /// - `m20230905093000_create_registrations` → version 20230905093000, slug "create_registrations"
    pub fn parse(name: &str) -> Result<Self, MigrationError> {
        let caps = NAME_PATTERN.captures(name).ok_or_else(|| MigrationError::InvalidName {
            name: name.to_string(),
            reason: "expected m{YYYYMMDDHHMMSS}_{slug}".to_string(),
        })?;

        let digits = &caps[1];
        NaiveDateTime::parse_from_str(digits, "%Y%m%d%H%M%S").map_err(|e| {
            MigrationError::InvalidName {
                name: name.to_string(),
                reason: format!("timestamp prefix is not a valid date: {e}"),
            }
        })?;
        let version = digits.parse::<i64>().map_err(|e| MigrationError::InvalidName {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            version,
            slug: caps[2].to_string(),
        })
    }

    /// Build a name for a migration created at `at` from a free-form description.
    pub fn generate(at: DateTime<Utc>, description: &str) -> Result<Self, MigrationError> {
        let slug = slugify(description);
        if slug.is_empty() {
            return Err(MigrationError::InvalidName {
                name: description.to_string(),
                reason: "description must contain at least one letter or digit".to_string(),
            });
        }

        let version = at
            .format("%Y%m%d%H%M%S")
            .to_string()
            .parse::<i64>()
            .map_err(|e| MigrationError::InvalidName {
                name: description.to_string(),
                reason: e.to_string(),
            })?;

        let name = Self { version, slug };
        validate_name(&name.to_string())?;
        Ok(name)
    }

    /// File name used by the generator: `m{version}_{slug}.rs`
    pub fn file_name(&self) -> String {
        format!("{self}.rs")
    }

    /// Module identifier for the generated file (same as the name)
    pub fn module_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MigrationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{:014}_{}", self.version, self.slug)
    }
}

/// Lower snake case: `"Add Ticket Prices"` → `"add_ticket_prices"`
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_separator = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('_');
            }
            pending_separator = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// Names stored in the ledger must be non-empty and fit the `name` column.
pub fn validate_name(name: &str) -> Result<(), MigrationError> {
    if name.trim().is_empty() {
        return Err(MigrationError::InvalidName {
            name: name.to_string(),
            reason: "name cannot be empty".to_string(),
        });
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(MigrationError::InvalidName {
            name: name.to_string(),
            reason: format!("name exceeds {MAX_NAME_LEN} characters"),
        });
    }
    Ok(())
}

/// `table` or `schema.table`, unquoted, at most 63 bytes per part.
pub fn is_valid_identifier(identifier: &str) -> bool {
    IDENTIFIER_PATTERN.is_match(identifier)
}
