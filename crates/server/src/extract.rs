//! Request extractors that answer malformed input with a JSON `{error}`.

use axum::extract::{FromRequest, FromRequestParts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
    typed_header::TypedHeaderRejection,
};
use engine::{Actor, SessionInfo};

use crate::ServerError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub(crate) struct ApiJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ServerError))]
pub(crate) struct ApiQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ServerError))]
pub(crate) struct ApiPath<T>(pub T);

pub(crate) type BearerHeader = Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>;

pub(crate) const TOKEN_REQUIRED: &str = "Access token required";
pub(crate) const INVALID_SESSION: &str = "Invalid or expired session";

/// `None` when the request carries no `Authorization` header at all.
pub(crate) fn bearer_token(header: BearerHeader) -> Result<Option<String>, ServerError> {
    match header {
        Ok(TypedHeader(Authorization(bearer))) => Ok(Some(bearer.token().to_string())),
        Err(rejection) if rejection.is_missing() => Ok(None),
        Err(_) => Err(ServerError::Unauthorized(INVALID_SESSION.to_string())),
    }
}

/// The session of an authenticated request, inserted by the auth layer next
/// to its [`Actor`].
#[derive(Clone, Debug)]
pub(crate) struct CurrentSession {
    pub token: String,
    pub info: SessionInfo,
}

impl CurrentSession {
    pub(crate) fn actor(&self) -> &Actor {
        &self.info.actor
    }
}
