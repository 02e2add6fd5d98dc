// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub name: String,
    pub delimiter: Option<String>,
    pub attributes: Vec<String>,
    pub selectable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailboxInfo {
    pub exists: u32,
    pub unseen: Option<u32>,
    pub uid_validity: Option<u32>,
    pub uid_next: Option<u32>,
}

/// A message as it came off the wire: either just the header block or the
/// full RFC 5322 source, depending on how it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMessage {
    pub uid: u32,
    pub flags: Vec<MessageFlag>,
    pub internal_date: Option<DateTime<FixedOffset>>,
    pub size: Option<u32>,
    pub content: Vec<u8>,
}

impl RawMessage {
    pub fn is_seen(&self) -> bool {
        self.flags.contains(&MessageFlag::Seen)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageFlag {
    Seen,
    Answered,
    Flagged,
    Deleted,
    Draft,
    Custom(String),
}

impl MessageFlag {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "\\seen" => MessageFlag::Seen,
            "\\answered" => MessageFlag::Answered,
            "\\flagged" => MessageFlag::Flagged,
            "\\deleted" => MessageFlag::Deleted,
            "\\draft" => MessageFlag::Draft,
            _ => MessageFlag::Custom(raw.to_string()),
        }
    }
}

impl fmt::Display for MessageFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageFlag::Seen => f.write_str("\\Seen"),
            MessageFlag::Answered => f.write_str("\\Answered"),
            MessageFlag::Flagged => f.write_str("\\Flagged"),
            MessageFlag::Deleted => f.write_str("\\Deleted"),
            MessageFlag::Draft => f.write_str("\\Draft"),
            MessageFlag::Custom(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreOperation {
    Add,
    Remove,
    Set,
}

impl StoreOperation {
    pub fn command(&self) -> &'static str {
        match self {
            StoreOperation::Add => "+FLAGS",
            StoreOperation::Remove => "-FLAGS",
            StoreOperation::Set => "FLAGS",
        }
    }
}

/// Renders `(\Seen \Flagged)` for a STORE command.
pub fn format_flag_list(flags: &[MessageFlag]) -> String {
    let items: Vec<String> = flags.iter().map(|f| f.to_string()).collect();
    format!("({})", items.join(" "))
}

/// Builds a compact UID set (`1:3,7,9:10`). Input order and duplicates
/// don't matter.
pub fn format_uid_set(uids: &[u32]) -> String {
    let mut sorted: Vec<u32> = uids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut parts = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return String::new();
    };
    let (mut start, mut end) = (first, first);

    for uid in iter {
        if uid == end + 1 {
            end = uid;
            continue;
        }
        parts.push(render_range(start, end));
        start = uid;
        end = uid;
    }
    parts.push(render_range(start, end));
    parts.join(",")
}

fn render_range(start: u32, end: u32) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}:{}", start, end)
    }
}

/// Header field a keyword search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchField {
    #[serde(alias = "subject")]
    Subject,
    #[serde(alias = "from")]
    From,
    #[serde(alias = "to")]
    To,
    #[serde(alias = "cc")]
    Cc,
    #[serde(alias = "body")]
    Body,
    #[serde(alias = "text")]
    Text,
}

impl SearchField {
    pub fn keyword(&self) -> &'static str {
        match self {
            SearchField::Subject => "SUBJECT",
            SearchField::From => "FROM",
            SearchField::To => "TO",
            SearchField::Cc => "CC",
            SearchField::Body => "BODY",
            SearchField::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    All,
    Seen(bool),
    Field(SearchField, String),
    And(Vec<SearchQuery>),
}

impl SearchQuery {
    /// Renders the query in IMAP SEARCH syntax. Non-ASCII keywords get a
    /// leading `CHARSET UTF-8`.
    pub fn to_imap(&self) -> String {
        let criteria = self.criteria();
        if self.needs_utf8() {
            format!("CHARSET UTF-8 {}", criteria)
        } else {
            criteria
        }
    }

    fn criteria(&self) -> String {
        match self {
            SearchQuery::All => "ALL".to_string(),
            SearchQuery::Seen(true) => "SEEN".to_string(),
            SearchQuery::Seen(false) => "UNSEEN".to_string(),
            SearchQuery::Field(field, keyword) => {
                format!("{} {}", field.keyword(), quote_string(keyword))
            }
            SearchQuery::And(parts) if parts.is_empty() => "ALL".to_string(),
            SearchQuery::And(parts) => parts
                .iter()
                .map(|p| p.criteria())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    fn needs_utf8(&self) -> bool {
        match self {
            SearchQuery::Field(_, keyword) => !keyword.is_ascii(),
            SearchQuery::And(parts) => parts.iter().any(SearchQuery::needs_utf8),
            _ => false,
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_imap())
    }
}

/// IMAP quoted string. CR and LF cannot appear in a quoted string, so they
/// are dropped.
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\r' | '\n' => {}
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
