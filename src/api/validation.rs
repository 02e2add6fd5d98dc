// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Request validation for the REST API.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::api::errors::ApiError;

/// Maximum folder name length
const MAX_FOLDER_NAME_LENGTH: usize = 255;

/// Maximum UIDs accepted in one bulk request
const MAX_UIDS: usize = 1000;

pub const MAX_PAGE_LIMIT: usize = 500;

lazy_static! {
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+'-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();
}

/// Custom validation functions
pub mod validators {
    use super::*;

    /// Accepts `user@host` and `Name <user@host>`.
    pub fn validate_email(email: &str) -> Result<(), ValidationError> {
        let email = email.trim();
        let bare = match (email.rfind('<'), email.ends_with('>')) {
            (Some(start), true) => &email[start + 1..email.len() - 1],
            _ => email,
        };
        if !EMAIL_REGEX.is_match(bare) {
            return Err(ValidationError::new("invalid_email_format"));
        }
        Ok(())
    }

    pub fn validate_recipients(recipients: &[String]) -> Result<(), ValidationError> {
        if recipients.is_empty() {
            return Err(ValidationError::new("recipients_empty"));
        }
        validate_optional_recipients(recipients)
    }

    pub fn validate_optional_recipients(recipients: &[String]) -> Result<(), ValidationError> {
        recipients.iter().try_for_each(|r| validate_email(r))
    }

    /// Folder names go to the server verbatim, so only the line-breaking
    /// characters that would split the IMAP command are refused.
    pub fn validate_folder_name(name: &str) -> Result<(), ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::new("folder_name_empty"));
        }

        if name.chars().count() > MAX_FOLDER_NAME_LENGTH {
            return Err(ValidationError::new("folder_name_too_long"));
        }

        if name.chars().any(|c| matches!(c, '\r' | '\n' | '\0')) {
            return Err(ValidationError::new("invalid_folder_name_characters"));
        }

        Ok(())
    }

    /// Validate UIDs list
    pub fn validate_uids(uids: &[u32]) -> Result<(), ValidationError> {
        if uids.is_empty() {
            return Err(ValidationError::new("uids_empty"));
        }

        if uids.len() > MAX_UIDS {
            return Err(ValidationError::new("too_many_uids"));
        }

        if uids.iter().any(|&uid| uid == 0) {
            return Err(ValidationError::new("invalid_uid_value"));
        }

        Ok(())
    }

    /// Validate pagination parameters
    pub fn validate_pagination(
        limit: Option<usize>,
        offset: Option<usize>,
        default_limit: usize,
    ) -> Result<(usize, usize), ValidationError> {
        let limit = limit.unwrap_or(default_limit);
        let offset = offset.unwrap_or(0);

        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(ValidationError::new("invalid_limit"));
        }

        Ok((limit, offset))
    }
}

/// Runs a validator against a query parameter and names the parameter in
/// the resulting error.
pub fn check_param<T: ?Sized>(
    param: &str,
    value: &T,
    validator: impl Fn(&T) -> Result<(), ValidationError>,
) -> Result<(), ApiError> {
    validator(value).map_err(|e| ApiError::BadRequest {
        message: format!("Invalid query parameter '{}': {}", param, e.code),
    })
}

pub fn check_uid(uid: u32) -> Result<(), ApiError> {
    if uid == 0 {
        return Err(ApiError::bad_request("UID must be greater than zero"));
    }
    Ok(())
}

// === Validated Request Structures ===

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReadStatusUpdateRequest {
    #[validate(custom(function = "validators::validate_uids"))]
    pub uids: Vec<u32>,
    #[validate(custom(function = "validators::validate_folder_name"))]
    pub folder_name: String,
    pub seen: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    #[validate(custom(function = "validators::validate_uids"))]
    pub uids: Vec<u32>,
    #[validate(custom(function = "validators::validate_folder_name"))]
    pub folder_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    #[validate(custom(function = "validators::validate_uids"))]
    pub uids: Vec<u32>,
    #[validate(custom(function = "validators::validate_folder_name"))]
    pub source_folder: String,
    #[validate(custom(function = "validators::validate_folder_name"))]
    pub destination_folder: String,
}

/// Validates a deserialized body, turning field errors into `ApiError`.
pub fn validate_payload<T: Validate>(payload: T) -> Result<T, ApiError> {
    payload.validate()?;
    Ok(payload)
}
