//! Well-known role names and the capability they gate.
//!
//! The administration surface uses a single capability; finer per-operation
//! permissions are a deliberate non-feature.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_DBA: &str = "dba";
pub const ROLE_OPERATOR: &str = "operator";
pub const ROLE_VIEWER: &str = "viewer";

/// The one capability every database administration endpoint requires.
pub const CAP_MANAGE_DATABASE: &str = "manage-database";

/// Whether `role` carries `capability`.
///
/// Unknown roles carry nothing.
pub fn role_has_capability(role: &str, capability: &str) -> bool {
    match capability {
        CAP_MANAGE_DATABASE => role == ROLE_ADMIN || role == ROLE_DBA,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_and_dba_manage_the_database() {
        assert!(role_has_capability(ROLE_ADMIN, CAP_MANAGE_DATABASE));
        assert!(role_has_capability(ROLE_DBA, CAP_MANAGE_DATABASE));
    }

    #[test]
    fn operator_and_viewer_do_not() {
        assert!(!role_has_capability(ROLE_OPERATOR, CAP_MANAGE_DATABASE));
        assert!(!role_has_capability(ROLE_VIEWER, CAP_MANAGE_DATABASE));
    }

    #[test]
    fn unknown_roles_and_capabilities_deny() {
        assert!(!role_has_capability("root", CAP_MANAGE_DATABASE));
        assert!(!role_has_capability(ROLE_ADMIN, "launch-missiles"));
    }
}
