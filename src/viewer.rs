// Request-scoped viewer context. The auth middleware verifies the bearer
// token once and injects the context into request extensions; handlers and
// the authorization gate only ever see the viewer, never raw headers.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{app_state::AppState, auth::tokens, error::AppError, models::User};

/// The identity acting on this request, as carried by its access token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}

#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub request_id: String,
    pub user: Option<AuthUser>,
}

impl ViewerContext {
    pub fn anonymous() -> Self {
        ViewerContext {
            request_id: format!("req-{}", Uuid::new_v4()),
            user: None,
        }
    }

    pub fn authenticated(user: AuthUser) -> Self {
        ViewerContext {
            request_id: format!("req-{}", Uuid::new_v4()),
            user: Some(user),
        }
    }

    pub fn for_user(user: &User) -> Self {
        Self::authenticated(AuthUser {
            id: user.id,
            username: user.username.clone(),
            is_staff: user.is_staff,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_staff(&self) -> bool {
        self.user.as_ref().map(|u| u.is_staff).unwrap_or(false)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }
}

/// Extractor wrapper with reference-like ergonomics over the shared
/// viewer context. Cloning is an Arc bump.
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let vc = parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR);

        async move { vc }
    }
}

/// Builds the viewer context for every request. No Authorization header
/// means an anonymous viewer (reads are public); a present-but-invalid
/// bearer token is rejected outright rather than downgraded.
pub async fn viewer_context_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let viewer = viewer_from_headers(request.headers(), &state)?;
    request.extensions_mut().insert(Arc::new(viewer));
    Ok(next.run(request).await)
}

fn viewer_from_headers(headers: &HeaderMap, state: &AppState) -> Result<ViewerContext, AppError> {
    let Some(auth_header) = headers.get("authorization") else {
        return Ok(ViewerContext::anonymous());
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("malformed authorization header".to_string()))?;

    let Some(token) = auth_str.strip_prefix("Bearer ") else {
        return Err(AppError::Unauthorized(
            "unsupported authorization scheme".to_string(),
        ));
    };

    let claims = tokens::verify(token, tokens::ACCESS, &state.config.auth)?;
    Ok(ViewerContext::authenticated(AuthUser {
        id: claims.user_id()?,
        username: claims.username,
        is_staff: claims.is_staff,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_viewer_has_no_identity() {
        let vc = ViewerContext::anonymous();
        assert!(!vc.is_authenticated());
        assert!(!vc.is_staff());
        assert_eq!(vc.user_id(), None);
        assert_eq!(vc.username(), None);
    }

    #[test]
    fn authenticated_viewer_exposes_identity() {
        let vc = ViewerContext::authenticated(AuthUser {
            id: 7,
            username: "bob".to_string(),
            is_staff: true,
        });
        assert!(vc.is_authenticated());
        assert!(vc.is_staff());
        assert_eq!(vc.user_id(), Some(7));
        assert_eq!(vc.username(), Some("bob"));
    }
}
