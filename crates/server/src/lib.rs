use api_types::ErrorBody;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::IntoResponse,
};
use engine::EngineError;

pub use server::{ServerState, router, run_with_listener};

mod extract;
mod payment_types;
mod payments;
mod server;
mod students;
mod users;

pub mod types {
    pub mod user {
        pub use api_types::user::{
            KeepAlive, Login, LoginResponse, PasswordChange, PermissionEntry, PermissionView,
            PermissionsResponse, PermissionsUpdate, ProfileUpdate, Registered, Resource, Role,
            SessionUser, SessionView, UserNew, UserUpdate, UserUpdated, UserView,
        };
    }

    pub mod student {
        pub use api_types::student::{
            Gender, StudentCreated, StudentNew, StudentUpdate, StudentUpdated, StudentView,
        };
    }

    pub mod payment_type {
        pub use api_types::payment_type::{
            PaymentTypeList, PaymentTypeNew, PaymentTypeUpdate, PaymentTypeUpdated,
            PaymentTypeView, Period,
        };
    }

    pub mod payment {
        pub use api_types::payment::{
            PaymentList, PaymentNew, PaymentStatus, PaymentUpdate, PaymentUpdated, PaymentView,
            PaymentsByMonth,
        };
    }

    pub use api_types::{Created, ErrorBody, Health, Message};
}

#[derive(Debug)]
pub enum ServerError {
    Engine(EngineError),
    /// Malformed request: body, query or path could not be parsed.
    Generic(String),
    Unauthorized(String),
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) | EngineError::StudentNotFound { .. } => StatusCode::NOT_FOUND,
        EngineError::Database(_) | EngineError::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidField(_)
        | EngineError::NothingToUpdate
        | EngineError::ExistingKey(_)
        | EngineError::MissingReference(_)
        | EngineError::InUse(_) => StatusCode::BAD_REQUEST,
    }
}

fn body_for_engine_error(err: EngineError) -> ErrorBody {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            internal_error()
        }
        EngineError::Password(msg) => {
            tracing::error!("password hashing error: {msg}");
            internal_error()
        }
        EngineError::StudentNotFound { searched } => ErrorBody {
            error: "Siswa tidak ditemukan".to_string(),
            searched_id: Some(searched),
        },
        other => ErrorBody {
            error: other.to_string(),
            searched_id: None,
        },
    }
}

pub(crate) fn internal_error() -> ErrorBody {
    ErrorBody {
        error: "internal server error".to_string(),
        searched_id: None,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), body_for_engine_error(err)),
            ServerError::Generic(error) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error,
                    searched_id: None,
                },
            ),
            ServerError::Unauthorized(error) => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    error,
                    searched_id: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<JsonRejection> for ServerError {
    fn from(value: JsonRejection) -> Self {
        Self::Generic(format!("Invalid JSON body: {}", value.body_text()))
    }
}

impl From<QueryRejection> for ServerError {
    fn from(value: QueryRejection) -> Self {
        Self::Generic(format!("Invalid query: {}", value.body_text()))
    }
}

impl From<PathRejection> for ServerError {
    fn from(value: PathRejection) -> Self {
        Self::Generic(format!("Invalid path parameter: {}", value.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_forbidden_maps_to_403() {
        let res = ServerError::from(EngineError::Forbidden("forbidden".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn engine_unauthorized_maps_to_401() {
        let res =
            ServerError::from(EngineError::Unauthorized("nope".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn engine_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = ServerError::from(EngineError::StudentNotFound {
            searched: "123".to_string(),
        })
        .into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn engine_validation_maps_to_400() {
        for err in [
            EngineError::InvalidField("x".to_string()),
            EngineError::NothingToUpdate,
            EngineError::ExistingKey("x".to_string()),
            EngineError::MissingReference("x".to_string()),
            EngineError::InUse("x".to_string()),
        ] {
            assert_eq!(ServerError::from(err).into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn database_error_is_hidden() {
        let err = EngineError::Database(sea_orm::DbErr::Custom("disk on fire".to_string()));
        assert_eq!(status_for_engine_error(&err), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_for_engine_error(err).error, "internal server error");
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
