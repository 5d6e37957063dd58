//! Static table registries used by analysis and deletion.
//!
//! The allow-list names every table the fleet application actively uses; the
//! protected list names tables the toolkit refuses to drop regardless of the
//! caller's permission level.

/// Tables the application is known to use. Anything outside this list is a
/// cleanup candidate surfaced by `/analyze-tables`.
pub const USED_TABLES: &[&str] = &[
    "atms",
    "banks",
    "contracts",
    "maintenance_records",
    "work_orders",
    "work_plans",
    "users",
    "audit_logs",
];

/// Tables the toolkit will never drop, independent of caller permission.
pub const PROTECTED_TABLES: &[&str] = &["users", "audit_logs", "_sqlx_migrations"];

/// Classification of a table for the analysis endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableClass {
    Used,
    Unused,
    Protected,
}

/// Classify a table name. Protection wins over usage.
pub fn classify_table(name: &str) -> TableClass {
    if is_protected(name) {
        TableClass::Protected
    } else if USED_TABLES.contains(&name) {
        TableClass::Used
    } else {
        TableClass::Unused
    }
}

/// Whether `name` is on the protected list.
pub fn is_protected(name: &str) -> bool {
    PROTECTED_TABLES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protection_wins_over_usage() {
        // `users` appears in both lists; the protected classification wins.
        assert_eq!(classify_table("users"), TableClass::Protected);
        assert_eq!(classify_table("audit_logs"), TableClass::Protected);
    }

    #[test]
    fn known_application_tables_are_used() {
        assert_eq!(classify_table("atms"), TableClass::Used);
        assert_eq!(classify_table("work_orders"), TableClass::Used);
    }

    #[test]
    fn everything_else_is_unused() {
        assert_eq!(classify_table("tmp_migration_2019"), TableClass::Unused);
        assert_eq!(classify_table("atms_backup_old"), TableClass::Unused);
    }

    #[test]
    fn migration_bookkeeping_is_protected() {
        assert!(is_protected("_sqlx_migrations"));
        assert!(!is_protected("atms"));
    }
}
