// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Error type returned by every REST handler, and its JSON body.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::error::MailError;
use crate::imap::error::ImapError;
use crate::services::attachment_storage::AttachmentError;
use crate::services::smtp::SmtpError;

/// Standardized error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<Vec<FieldError>>,
    /// Correlates the response with the server log line
    pub request_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    // === 400 ===
    #[error("Validation failed: {message}")]
    ValidationFailed {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("Invalid request: {message}")]
    BadRequest { message: String },

    // === 404 ===
    #[error("Folder not found: {folder}")]
    FolderNotFound { folder: String },

    #[error("Email not found: UID {uid} in folder '{folder}'")]
    EmailNotFound { folder: String, uid: u32 },

    #[error("No HTML content for UID {uid} in folder '{folder}'")]
    HtmlContentNotFound { folder: String, uid: u32 },

    #[error("Attachment not found: index {index} (message has {count})")]
    AttachmentNotFound { index: usize, count: usize },

    // === 5xx ===
    #[error("Mail server unavailable: {message}")]
    ImapUnavailable { message: String },

    #[error("Mail server timed out: {message}")]
    ImapTimeout { message: String },

    #[error("IMAP operation failed: {message}")]
    ImapOperation { message: String },

    #[error("SMTP delivery failed: {message}")]
    SmtpFailed { message: String },

    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl ApiError {
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ValidationFailed { .. } => "VALIDATION_FAILED",
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::FolderNotFound { .. } => "FOLDER_NOT_FOUND",
            ApiError::EmailNotFound { .. } => "EMAIL_NOT_FOUND",
            ApiError::HtmlContentNotFound { .. } => "HTML_CONTENT_NOT_FOUND",
            ApiError::AttachmentNotFound { .. } => "ATTACHMENT_NOT_FOUND",
            ApiError::ImapUnavailable { .. } => "IMAP_UNAVAILABLE",
            ApiError::ImapTimeout { .. } => "IMAP_TIMEOUT",
            ApiError::ImapOperation { .. } => "IMAP_OPERATION_ERROR",
            ApiError::SmtpFailed { .. } => "SMTP_ERROR",
            ApiError::InternalError { .. } => "INTERNAL_ERROR",
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ValidationFailed { .. } | ApiError::BadRequest { .. } => {
                StatusCode::BAD_REQUEST
            }

            ApiError::FolderNotFound { .. }
            | ApiError::EmailNotFound { .. }
            | ApiError::HtmlContentNotFound { .. }
            | ApiError::AttachmentNotFound { .. } => StatusCode::NOT_FOUND,

            ApiError::SmtpFailed { .. } => StatusCode::BAD_GATEWAY,
            ApiError::ImapUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ImapTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,

            ApiError::ImapOperation { .. } | ApiError::InternalError { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let request_id = Uuid::new_v4().to_string();

        match status.as_u16() {
            400..=499 => log::warn!("Client error [{}]: {} ({})", request_id, self, status),
            _ => log::error!("Server error [{}]: {} ({})", request_id, self, status),
        }

        let validation_errors = match self {
            ApiError::ValidationFailed { errors, .. } if !errors.is_empty() => Some(errors.clone()),
            _ => None,
        };

        HttpResponse::build(status).json(ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
            validation_errors,
            request_id,
            timestamp: chrono::Utc::now(),
        })
    }
}

// === Type Conversions ===

impl From<ImapError> for ApiError {
    fn from(err: ImapError) -> Self {
        match err {
            ImapError::FolderNotFound(folder) => ApiError::FolderNotFound { folder },
            ImapError::Connection(message) | ImapError::Tls(message) | ImapError::Auth(message) => {
                ApiError::ImapUnavailable { message }
            }
            ImapError::Timeout(message) => ApiError::ImapTimeout { message },
            other => ApiError::ImapOperation {
                message: other.to_string(),
            },
        }
    }
}

impl From<SmtpError> for ApiError {
    fn from(err: SmtpError) -> Self {
        match err {
            SmtpError::InvalidAddress { .. } => ApiError::bad_request(err.to_string()),
            SmtpError::ConfigError(message) => ApiError::InternalError { message },
            other => ApiError::SmtpFailed {
                message: other.to_string(),
            },
        }
    }
}

impl From<AttachmentError> for ApiError {
    fn from(err: AttachmentError) -> Self {
        match err {
            AttachmentError::NotFound { index, count } => {
                ApiError::AttachmentNotFound { index, count }
            }
            AttachmentError::IoError(e) => ApiError::InternalError {
                message: format!("Failed to store attachment: {}", e),
            },
        }
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::Imap(e) => e.into(),
            MailError::Smtp(e) => e.into(),
            MailError::Attachment(e) => e.into(),
            MailError::EmailNotFound { folder, uid } => ApiError::EmailNotFound { folder, uid },
            MailError::HtmlContentNotFound { folder, uid } => {
                ApiError::HtmlContentNotFound { folder, uid }
            }
            MailError::Parse { .. } => ApiError::InternalError {
                message: err.to_string(),
            },
            MailError::Validation(message) => ApiError::ValidationFailed {
                message,
                errors: vec![],
            },
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut field_errors: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string()),
                })
            })
            .collect();
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationFailed {
            message: "Request validation failed".to_string(),
            errors: field_errors,
        }
    }
}
