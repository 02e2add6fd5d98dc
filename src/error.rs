// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::imap::error::ImapError;
use crate::services::attachment_storage::AttachmentError;
use crate::services::smtp::SmtpError;

/// Errors surfaced by the mail services.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("IMAP error: {0}")]
    Imap(#[from] ImapError),

    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Attachment error: {0}")]
    Attachment(#[from] AttachmentError),

    #[error("Email not found: UID {uid} in folder '{folder}'")]
    EmailNotFound { folder: String, uid: u32 },

    #[error("Email UID {uid} in folder '{folder}' has no HTML content")]
    HtmlContentNotFound { folder: String, uid: u32 },

    #[error("Failed to parse message UID {uid}")]
    Parse { uid: u32 },

    #[error("Validation error: {0}")]
    Validation(String),
}
