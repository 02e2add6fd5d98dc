// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Maps fetched IMAP messages to the JSON response models.

use log::warn;
use mail_parser::{Address, Message, MessageParser, MimeHeaders, PartType};

use crate::error::MailError;
use crate::imap::types::RawMessage;
use crate::models::email::{AttachmentSummary, EmailDetail, EmailSummary, SentEmailSummary};

/// An attachment pulled out of a message, ready to be written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedAttachment {
    pub index: usize,
    pub filename: Option<String>,
    pub content_type: String,
    pub content: Vec<u8>,
}

fn parse(raw: &RawMessage) -> Option<Message<'_>> {
    MessageParser::default().parse(&raw.content)
}

fn parse_required(raw: &RawMessage) -> Result<Message<'_>, MailError> {
    parse(raw).ok_or(MailError::Parse { uid: raw.uid })
}

/// Bare addresses from an address header, in header order.
fn addresses(address: Option<&Address<'_>>) -> Vec<String> {
    address
        .map(|a| {
            a.iter()
                .filter_map(|addr| addr.address().or_else(|| addr.name()))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn first_address(address: Option<&Address<'_>>) -> String {
    addresses(address).into_iter().next().unwrap_or_default()
}

/// `Date:` header, falling back to INTERNALDATE, as RFC 3339.
fn message_date(message: Option<&Message<'_>>, raw: &RawMessage) -> String {
    message
        .and_then(|m| m.date())
        .map(|d| d.to_rfc3339())
        .or_else(|| raw.internal_date.map(|d| d.to_rfc3339()))
        .unwrap_or_default()
}

fn content_type_of(part: &mail_parser::MessagePart<'_>) -> String {
    part.content_type()
        .map(|ct| match ct.subtype() {
            Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
            None => ct.ctype().to_string(),
        })
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Builds a listing row. Headers that fail to parse produce a row with
/// empty fields instead of failing the whole listing.
pub fn to_summary(raw: &RawMessage) -> EmailSummary {
    let message = parse(raw);
    if message.is_none() {
        warn!("Could not parse headers of UID {}", raw.uid);
    }

    EmailSummary {
        uid: raw.uid,
        from: first_address(message.as_ref().and_then(|m| m.from())),
        subject: message
            .as_ref()
            .and_then(|m| m.subject())
            .unwrap_or_default()
            .to_string(),
        date: message_date(message.as_ref(), raw),
        seen: raw.is_seen(),
    }
}

pub fn to_sent_summary(raw: &RawMessage) -> SentEmailSummary {
    let message = parse(raw);
    if message.is_none() {
        warn!("Could not parse headers of sent UID {}", raw.uid);
    }

    SentEmailSummary {
        id: message
            .as_ref()
            .and_then(|m| m.message_id())
            .map(str::to_string)
            .unwrap_or_else(|| format!("uid:{}", raw.uid)),
        to: addresses(message.as_ref().and_then(|m| m.to())).join(", "),
        subject: message
            .as_ref()
            .and_then(|m| m.subject())
            .unwrap_or_default()
            .to_string(),
        date: message_date(message.as_ref(), raw),
    }
}

fn html_part(message: &Message<'_>) -> Option<String> {
    // html_bodies() falls back to text parts; only real HTML counts here
    message.html_bodies().find_map(|part| match &part.body {
        PartType::Html(html) => Some(html.to_string()),
        _ => None,
    })
}

pub fn to_detail(raw: &RawMessage) -> Result<EmailDetail, MailError> {
    let message = parse_required(raw)?;

    let attachments = message
        .attachments()
        .enumerate()
        .map(|(index, part)| AttachmentSummary {
            index,
            filename: part.attachment_name().unwrap_or_default().to_string(),
            content_type: content_type_of(part),
            size: part.len(),
        })
        .collect();

    Ok(EmailDetail {
        uid: raw.uid,
        from: first_address(message.from()),
        to: addresses(message.to()),
        cc: addresses(message.cc()),
        subject: message.subject().unwrap_or_default().to_string(),
        date: message_date(Some(&message), raw),
        seen: raw.is_seen(),
        text_body: message.body_text(0).map(|body| body.into_owned()),
        html_body: html_part(&message),
        attachments,
    })
}

pub fn html_content(raw: &RawMessage) -> Result<Option<String>, MailError> {
    let message = parse_required(raw)?;
    Ok(html_part(&message))
}

/// Attachments in MIME order; `index` matches `AttachmentSummary::index`.
pub fn extract_attachments(raw: &RawMessage) -> Result<Vec<ExtractedAttachment>, MailError> {
    let message = parse_required(raw)?;
    Ok(message
        .attachments()
        .enumerate()
        .map(|(index, part)| ExtractedAttachment {
            index,
            filename: part.attachment_name().map(str::to_string),
            content_type: content_type_of(part),
            content: part.contents().to_vec(),
        })
        .collect())
}
