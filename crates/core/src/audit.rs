//! Audit action vocabulary.
//!
//! Lives in `core` (zero internal deps) so both the repository layer and any
//! future CLI tooling share one set of action names.

use serde::{Deserialize, Serialize};

/// The kind of privileged operation an audit entry documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Query,
    Export,
    Import,
    Backup,
    View,
}

impl AuditAction {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Query => "QUERY",
            Self::Export => "EXPORT",
            Self::Import => "IMPORT",
            Self::Backup => "BACKUP",
            Self::View => "VIEW",
        }
    }

    /// Parse from the database string, `None` for unknown input.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(Self::Create),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            "QUERY" => Some(Self::Query),
            "EXPORT" => Some(Self::Export),
            "IMPORT" => Some(Self::Import),
            "BACKUP" => Some(Self::Backup),
            "VIEW" => Some(Self::View),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
