use crate::{data::student::FieldErrors, routes::api::ApiResponse};
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use snafu::Snafu;
use std::num::{ParseIntError, TryFromIntError};

pub type RosterResult<T> = Result<T, RosterError>;

/// The three ways a roster operation can fail, as seen by a caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Invalid,
    StoreError,
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RosterError {
    #[snafu(display("Error opening database"))]
    OpenDatabase { source: sqlx::Error },
    #[snafu(display("Error making SQL query"))]
    MakeQuery { source: sqlx::Error },
    #[snafu(display("Error migrating DB schema"))]
    MigrateError { source: sqlx::migrate::MigrateError },
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse IP port"))]
    ParsePort { source: ParseIntError },
    #[snafu(display("Unknown store backend {:?}, expected `postgres` or `memory`", found))]
    UnknownStoreBackend { found: String },
    #[snafu(display("Unable to parse student id {:?}", original))]
    InvalidId {
        source: ParseIntError,
        original: String,
    },
    #[snafu(display("Malformed request body: {}", source))]
    MalformedBody { source: JsonRejection },
    #[snafu(display("Student failed validation"))]
    InvalidStudent { problems: FieldErrors },
    #[snafu(display("Unable to find student with ID: {}", id))]
    MissingStudent { id: i32 },
    #[snafu(display("Student {} has a negative counter in the store", id))]
    CorruptCounter { id: i32, source: TryFromIntError },
}

impl RosterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingStudent { .. } => ErrorKind::NotFound,
            Self::InvalidId { .. } | Self::MalformedBody { .. } | Self::InvalidStudent { .. } => {
                ErrorKind::Invalid
            }
            Self::MakeQuery { source } => match source {
                sqlx::Error::Database(db)
                    if !matches!(db.kind(), sqlx::error::ErrorKind::Other) =>
                {
                    ErrorKind::Invalid
                }
                _ => ErrorKind::StoreError,
            },
            Self::OpenDatabase { .. }
            | Self::MigrateError { .. }
            | Self::BadEnvVar { .. }
            | Self::ParsePort { .. }
            | Self::UnknownStoreBackend { .. }
            | Self::CorruptCounter { .. } => ErrorKind::StoreError,
        }
    }
}

impl IntoResponse for RosterError {
    fn into_response(self) -> Response {
        let status_code = match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Invalid => StatusCode::BAD_REQUEST,
            ErrorKind::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let data = match &self {
            Self::InvalidStudent { problems } => problems.to_json(),
            _ => Value::Null,
        };

        if status_code.is_server_error() {
            error!(?self, "Error!");
        } else {
            warn!(?self, "Rejected request");
        }

        (
            status_code,
            Json(ApiResponse {
                message: self.to_string().into(),
                data,
            }),
        )
            .into_response()
    }
}
