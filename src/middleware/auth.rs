use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};

use crate::{AppState, error::AppError, infrastructure::Identity, models::Role};

/// Resolves the caller from `Authorization: Bearer <token>` and stores the
/// `Identity` in the request extensions. Nothing behind this layer runs for
/// an unauthenticated request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = authenticate(&state, bearer)?;
    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn authenticate(
    state: &AppState,
    bearer: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
) -> Result<Identity, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer
        .map_err(|_| AppError::Unauthenticated("Not authorized, no token".into()))?;

    Ok(state.tokens.verify(bearer.token())?)
}

pub fn authorize(identity: &Identity, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&identity.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            identity.role
        )))
    }
}

/// Role gate for admin routes. Must sit behind `auth_middleware`; a request
/// that reaches it without an identity is treated as unauthenticated.
pub async fn admin_only(request: Request, next: Next) -> Result<Response, AppError> {
    let identity = request
        .extensions()
        .get::<Identity>()
        .ok_or_else(|| AppError::Unauthenticated("Not authorized, no token".into()))?;

    authorize(identity, Role::ADMIN_ONLY)?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            subject_id: Uuid::new_v4(),
            role,
        }
    }

    #[test]
    fn admin_only_routes_reject_users() {
        assert!(matches!(
            authorize(&identity(Role::User), Role::ADMIN_ONLY),
            Err(AppError::Forbidden(_))
        ));
        assert!(authorize(&identity(Role::Admin), Role::ADMIN_ONLY).is_ok());
    }

    #[test]
    fn any_authenticated_role_passes_general_routes() {
        assert!(authorize(&identity(Role::User), Role::ANY).is_ok());
        assert!(authorize(&identity(Role::Admin), Role::ANY).is_ok());
    }
}
