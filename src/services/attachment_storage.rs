// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use log::{debug, info};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;

use crate::models::email::SavedAttachment;
use crate::utils::email_parser::ExtractedAttachment;

const MAX_FILENAME_CHARS: usize = 200;

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Attachment index {index} out of range (message has {count})")]
    NotFound { index: usize, count: usize },
}

/// Makes a name safe to use as a single path component.
/// Replaces separators and reserved characters, strips leading dots.
pub fn sanitize_component(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let trimmed: String = cleaned
        .trim()
        .trim_start_matches('.')
        .chars()
        .take(MAX_FILENAME_CHARS)
        .collect();

    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed
    }
}

fn extension_for(content_type: &str) -> &'static str {
    let subtype = content_type.rsplit('/').next().unwrap_or_default();
    match subtype.to_ascii_lowercase().as_str() {
        "pdf" => "pdf",
        "jpeg" | "jpg" => "jpg",
        "png" => "png",
        "gif" => "gif",
        "plain" => "txt",
        "html" => "html",
        "csv" => "csv",
        "zip" => "zip",
        "rfc822" => "eml",
        _ => "bin",
    }
}

/// File name an attachment is stored under.
pub fn attachment_filename(attachment: &ExtractedAttachment) -> String {
    match attachment.filename.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => sanitize_component(name),
        _ => format!(
            "attachment_{}.{}",
            attachment.index,
            extension_for(&attachment.content_type)
        ),
    }
}

/// Format: {base}/{folder}/{uid}/{filename}
pub fn attachment_path(base: &Path, folder: &str, uid: u32, filename: &str) -> PathBuf {
    base.join(sanitize_component(folder))
        .join(uid.to_string())
        .join(filename)
}

/// Stored names for every attachment of one message, in the same order.
/// A name already taken (ignoring case) gets the attachment index appended
/// to its stem: `scan.pdf`, `scan_1.pdf`.
pub fn stored_filenames(attachments: &[ExtractedAttachment]) -> Vec<String> {
    let mut taken = HashSet::new();
    attachments
        .iter()
        .map(|attachment| {
            let base = attachment_filename(attachment);
            let mut candidate = base.clone();
            let mut round = 1;
            while !taken.insert(candidate.to_lowercase()) {
                let suffix = if round == 1 {
                    attachment.index.to_string()
                } else {
                    format!("{}_{}", attachment.index, round)
                };
                candidate = with_suffix(&base, &suffix);
                round += 1;
            }
            candidate
        })
        .collect()
}

fn with_suffix(name: &str, suffix: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}_{}.{}", stem, suffix, ext),
        _ => format!("{}_{}", name, suffix),
    }
}

/// Pairs each attachment with the name it is stored under.
pub fn with_stored_filenames(
    attachments: Vec<ExtractedAttachment>,
) -> Vec<(ExtractedAttachment, String)> {
    let names = stored_filenames(&attachments);
    attachments.into_iter().zip(names).collect()
}

/// Picks one attachment by its zero-based index, along with its stored name.
pub fn select_attachment(
    attachments: Vec<ExtractedAttachment>,
    index: usize,
) -> Result<(ExtractedAttachment, String), AttachmentError> {
    let count = attachments.len();
    with_stored_filenames(attachments)
        .into_iter()
        .find(|(a, _)| a.index == index)
        .ok_or(AttachmentError::NotFound { index, count })
}

/// Writes an attachment to disk under `filename`, overwriting any previous copy.
pub async fn save_attachment(
    base: &Path,
    folder: &str,
    uid: u32,
    attachment: &ExtractedAttachment,
    filename: &str,
) -> Result<SavedAttachment, AttachmentError> {
    let storage_path = attachment_path(base, folder, uid, filename);

    if let Some(parent) = storage_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&storage_path, &attachment.content).await?;

    debug!("Saved attachment {} to {:?}", filename, storage_path);
    info!(
        "Saved attachment #{} of UID {} in '{}' ({} bytes)",
        attachment.index,
        uid,
        folder,
        attachment.content.len()
    );

    Ok(SavedAttachment {
        index: attachment.index,
        filename: filename.to_string(),
        path: storage_path,
        size: attachment.content.len(),
    })
}
