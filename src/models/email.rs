// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One row of a folder listing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EmailSummary {
    pub uid: u32,
    pub from: String,
    pub subject: String,
    pub date: String,
    pub seen: bool,
}

/// One row of the sent-mail listing.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SentEmailSummary {
    pub id: String,
    pub to: String,
    pub subject: String,
    pub date: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AttachmentSummary {
    pub index: usize,
    pub filename: String,
    pub content_type: String,
    pub size: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EmailDetail {
    pub uid: u32,
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub date: String,
    pub seen: bool,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
    pub attachments: Vec<AttachmentSummary>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SavedAttachment {
    pub index: usize,
    pub filename: String,
    pub path: PathBuf,
    pub size: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatusResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeleteResponse {
    pub message: String,
    pub deleted: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MoveResponse {
    pub message: String,
    pub moved: usize,
}
