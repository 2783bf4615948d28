use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::middleware::logging::ErrorRecord;

/// Field name -> messages, as shown next to the offending form input.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(FieldErrors),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Uniqueness { field: String, message: String },
    #[error("{0}")]
    ReferentialIntegrity(String),
    #[error("Data store unavailable: {0}")]
    DataUnavailable(#[from] DbErr),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error("Payload too large")]
    PayloadTooLarge,
}

impl ApiError {
    pub fn not_found(what: &str, key: impl std::fmt::Display) -> ApiError {
        ApiError::NotFound(format!("No {what} with {key} was found."))
    }

    pub fn unique(field: &str, message: impl Into<String>) -> ApiError {
        ApiError::Uniqueness {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Maps constraint violations reported by the database. Anything else stays
    /// a store failure.
    pub fn from_write(err: DbErr, field: &str, what: &str) -> ApiError {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                ApiError::unique(field, format!("{what} with this {field} already exists"))
            }
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => ApiError::ReferentialIntegrity(
                format!("{what} is referenced by other records"),
            ),
            _ => ApiError::DataUnavailable(err),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Uniqueness { .. } | ApiError::ReferentialIntegrity(_) => StatusCode::CONFLICT,
            ApiError::DataUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::NotFound(_) => "not_found",
            ApiError::Uniqueness { .. } => "uniqueness",
            ApiError::ReferentialIntegrity(_) => "referential_integrity",
            ApiError::DataUnavailable(_) => "data_unavailable",
            ApiError::Unauthorized => "unauthorized",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::PayloadTooLarge => "payload_too_large",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let record = ErrorRecord {
            kind: self.kind(),
            detail: self.to_string(),
        };

        let body = match &self {
            ApiError::Validation(fields) => json!({
                "error": "Validation failed",
                "fields": fields,
            }),
            ApiError::Uniqueness { field, message } => {
                let mut fields = FieldErrors::new();
                push_field_error(&mut fields, field.as_str(), message.as_str());
                json!({
                    "error": message,
                    "fields": fields,
                })
            }
            // the cause goes to the log only
            ApiError::DataUnavailable(_) => json!({
                "error": "Data is temporarily unavailable, try again later."
            }),
            other => json!({ "error": other.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(record);
        response
    }
}

/// Flattens validator output, nested lists included, into `FieldErrors`.
/// List entries are keyed as `field[index].inner`.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    collect(errors, "", &mut out);
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let key = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(list) => {
                let messages = out.entry(key).or_default();
                for err in list {
                    messages.push(
                        err.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| err.code.to_string()),
                    );
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &key, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{key}[{index}]"), out);
                }
            }
        }
    }
}

pub fn push_field_error(errors: &mut FieldErrors, field: impl Into<String>, message: impl Into<String>) {
    errors.entry(field.into()).or_default().push(message.into());
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Line {
        #[validate(length(max = 3, message = "too long"))]
        value: String,
    }

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1))]
        name: String,
        #[validate(nested)]
        lines: Vec<Line>,
    }

    #[test]
    fn flattens_nested_list_errors() {
        let form = Form {
            name: String::new(),
            lines: vec![
                Line { value: "ok".into() },
                Line { value: "too long".into() },
            ],
        };
        let errors = form.validate().unwrap_err();
        let fields = field_errors(&errors);

        assert_eq!(fields.get("name"), Some(&vec!["length".to_string()]));
        assert_eq!(
            fields.get("lines[1].value"),
            Some(&vec!["too long".to_string()])
        );
        assert!(!fields.contains_key("lines[0].value"));
    }

    #[test]
    fn store_failures_hide_their_cause() {
        let response = ApiError::DataUnavailable(DbErr::Custom("socket closed".into())).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let record = response.extensions().get::<ErrorRecord>().unwrap();
        assert!(record.detail.contains("socket closed"));
    }
}
