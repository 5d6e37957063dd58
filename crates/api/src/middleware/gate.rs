//! Capability gate extractor.
//!
//! Wraps [`AuthUser`] and rejects requests whose role does not carry the
//! `manage-database` capability. Every administrative route takes this
//! extractor, so authorization is enforced at the type level before any
//! side effect.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use atmfleet_core::error::CoreError;
use atmfleet_core::roles::{role_has_capability, CAP_MANAGE_DATABASE};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `manage-database` capability. Rejects with 403 otherwise.
///
/// ```ignore
/// async fn admin_only(RequireManageDatabase(user): RequireManageDatabase) -> AppResult<Json<()>> {
///     // user's role is guaranteed to carry the capability here
///     Ok(Json(()))
/// }
/// ```
pub struct RequireManageDatabase(pub AuthUser);

impl FromRequestParts<AppState> for RequireManageDatabase {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !role_has_capability(&user.role, CAP_MANAGE_DATABASE) {
            return Err(AppError::Core(CoreError::Forbidden(format!(
                "insufficient-permission: role '{}' lacks the '{CAP_MANAGE_DATABASE}' capability",
                user.role
            ))));
        }
        Ok(RequireManageDatabase(user))
    }
}
