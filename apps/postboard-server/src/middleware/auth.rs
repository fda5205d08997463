//! Identity extraction.
//!
//! Pages are open to everyone, so a missing or broken token never fails a request;
//! it only makes the request anonymous.

use actix_web::{FromRequest, HttpRequest, dev::Payload, http::header, web};
use std::future::{Ready, ready};
use std::sync::Arc;

use postboard_core::domain::Identity;
use postboard_core::ports::{AuthError, TokenService};

/// Cookie carrying the access token for browser clients.
pub const TOKEN_COOKIE: &str = "access_token";

/// The acting identity, `None` for anonymous requests.
///
/// ```ignore
/// async fn page(identity: OptionalIdentity) -> impl Responder {
///     identity.as_ref().map(|i| i.username.clone())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn as_ref(&self) -> Option<&Identity> {
        self.0.as_ref()
    }
}

/// Pull the raw token from `Authorization: Bearer` or the token cookie.
fn extract_token(req: &HttpRequest) -> Result<String, AuthError> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        let auth_str = value
            .to_str()
            .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

        return auth_str
            .strip_prefix("Bearer ")
            .map(str::to_string)
            .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()));
    }

    req.cookie(TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .ok_or(AuthError::MissingAuth)
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AuthError> {
    let token_service = req
        .app_data::<web::Data<Arc<dyn TokenService>>>()
        .ok_or_else(|| {
            tracing::error!("TokenService not found in app data");
            AuthError::InvalidToken("Server configuration error".to_string())
        })?;

    let token = extract_token(req)?;
    token_service.validate_token(&token).map(Identity::from)
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match authenticate(req) {
            Ok(identity) => ready(Ok(OptionalIdentity(Some(identity)))),
            Err(AuthError::MissingAuth) => ready(Ok(OptionalIdentity(None))),
            Err(e) => {
                tracing::debug!(error = %e, "Treating request as anonymous");
                ready(Ok(OptionalIdentity(None)))
            }
        }
    }
}
