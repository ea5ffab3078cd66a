//! Identifier to domain mappings.
//!
//! The mapping table is the whole authorization model: an identifier that is
//! not in the table is never served. It is built once at startup and only read
//! afterwards, so it can be shared across request tasks behind an `Arc`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One servable identifier and the domain whose AAAA record it follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mapping {
    /// Opaque token taken from the request path.
    #[serde(alias = "uuid")]
    pub identifier: String,
    /// DNS name carrying the IP4P record.
    pub domain: String,
}

impl Mapping {
    /// Create a mapping.
    pub fn new(identifier: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            domain: domain.into(),
        }
    }
}

/// Immutable lookup table of identifier -> domain.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<String, String>,
    duplicates: Vec<String>,
}

impl MappingTable {
    /// Build the table from mappings.
    ///
    /// When an identifier appears more than once the first mapping wins and
    /// the identifier is recorded in [`MappingTable::duplicates`].
    pub fn new(mappings: impl IntoIterator<Item = Mapping>) -> Self {
        let mut entries = HashMap::new();
        let mut duplicates = Vec::new();

        for Mapping { identifier, domain } in mappings {
            if entries.contains_key(&identifier) {
                duplicates.push(identifier);
            } else {
                entries.insert(identifier, domain);
            }
        }

        Self {
            entries,
            duplicates,
        }
    }

    /// Domain mapped to `identifier`, by exact string equality.
    #[must_use]
    pub fn lookup(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(String::as_str)
    }

    /// Number of servable identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no identifier is servable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers that were ignored because an earlier mapping claimed them.
    #[must_use]
    pub fn duplicates(&self) -> &[String] {
        &self.duplicates
    }
}

impl FromIterator<Mapping> for MappingTable {
    fn from_iter<I: IntoIterator<Item = Mapping>>(iter: I) -> Self {
        Self::new(iter)
    }
}
