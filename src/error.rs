use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::env;
use std::fmt::{self, Debug, Display};

const UNAUTHORIZED: i32 = 100;
const FORBIDDEN: i32 = 101;
const NOT_FOUND: i32 = 102;
const VALIDATION: i32 = 103;
const CONFLICT: i32 = 104;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub code: i32,
    pub message: String,
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for Error {}

impl From<env::VarError> for Error {
    fn from(err: env::VarError) -> Self {
        Error::env_var_error(err)
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Error::database_error(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::reqwest_error(err)
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        Error::authorizor_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.code {
            1..=99 => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            UNAUTHORIZED => (StatusCode::UNAUTHORIZED, self.message.as_str()),
            FORBIDDEN => (StatusCode::FORBIDDEN, self.message.as_str()),
            NOT_FOUND => (StatusCode::NOT_FOUND, self.message.as_str()),
            _ => (StatusCode::BAD_REQUEST, self.message.as_str()),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl Error {
    pub fn unauthorized_error() -> Self {
        Self {
            code: UNAUTHORIZED,
            message: "Unauthorized".into(),
        }
    }

    pub fn forbidden_error() -> Self {
        Self {
            code: FORBIDDEN,
            message: "Forbidden".into(),
        }
    }

    pub fn not_found_error(what: &str) -> Self {
        Self {
            code: NOT_FOUND,
            message: format!("{} not found", what),
        }
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self {
            code: VALIDATION,
            message: message.into(),
        }
    }

    pub fn conflict_error(message: impl Into<String>) -> Self {
        Self {
            code: CONFLICT,
            message: message.into(),
        }
    }

    pub fn env_var_error(_: env::VarError) -> Self {
        Self {
            code: 1,
            message: "environment variable error".into(),
        }
    }

    pub fn database_error<T: Debug>(err: T) -> Self {
        tracing::error!("database error: {:?}", err);

        Self {
            code: 2,
            message: "database error".into(),
        }
    }

    pub fn reqwest_error(err: reqwest::Error) -> Self {
        tracing::error!("reqwest error: {:?}", err);

        Self {
            code: 3,
            message: "reqwest error".into(),
        }
    }

    pub fn upstream_error() -> Self {
        Self {
            code: 4,
            message: "upstream error".into(),
        }
    }

    pub fn unexpected_error() -> Self {
        Self {
            code: 5,
            message: "unexpected error".into(),
        }
    }

    pub fn authorizor_error(err: oso::OsoError) -> Self {
        tracing::error!("authorizor error: {:?}", err);

        Self {
            code: 6,
            message: "authorizor error".into(),
        }
    }

    pub fn is_unauthorized_error(&self) -> bool {
        self.code == UNAUTHORIZED
    }

    pub fn is_forbidden_error(&self) -> bool {
        self.code == FORBIDDEN
    }

    pub fn is_not_found_error(&self) -> bool {
        self.code == NOT_FOUND
    }

    pub fn is_validation_error(&self) -> bool {
        self.code == VALIDATION
    }

    pub fn is_conflict_error(&self) -> bool {
        self.code == CONFLICT
    }

    pub fn is_internal_error(&self) -> bool {
        (1..=99).contains(&self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = vec![
            (Error::unauthorized_error(), StatusCode::UNAUTHORIZED),
            (Error::forbidden_error(), StatusCode::FORBIDDEN),
            (Error::not_found_error("ride"), StatusCode::NOT_FOUND),
            (Error::validation_error("bad"), StatusCode::BAD_REQUEST),
            (Error::conflict_error("ride is full"), StatusCode::BAD_REQUEST),
            (Error::upstream_error(), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::unexpected_error(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn kind_predicates() {
        assert!(Error::conflict_error("duplicate").is_conflict_error());
        assert!(!Error::conflict_error("duplicate").is_validation_error());
        assert!(Error::upstream_error().is_internal_error());
        assert!(!Error::forbidden_error().is_internal_error());
    }
}
