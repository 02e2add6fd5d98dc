// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use async_imap::types::{Fetch, Flag, Mailbox, Name, NameAttribute};
use async_trait::async_trait;
use futures_util::stream::TryStreamExt;
use log::{debug, warn};
use std::collections::HashSet;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_util::compat::Compat;

use crate::imap::{
    error::ImapError,
    types::{
        format_flag_list, format_uid_set, Folder, MailboxInfo, MessageFlag, RawMessage,
        SearchQuery, StoreOperation,
    },
};

pub type TlsCompatibleStream = Compat<TlsStream<TcpStream>>;
pub type TlsImapSession = async_imap::Session<TlsCompatibleStream>;

const HEADER_FETCH_QUERY: &str = "(UID FLAGS INTERNALDATE RFC822.SIZE BODY.PEEK[HEADER])";
const FULL_FETCH_QUERY: &str = "(UID FLAGS INTERNALDATE RFC822.SIZE BODY.PEEK[])";

/// One logged-in IMAP connection.
///
/// Message-level operations act on the folder chosen by the last
/// `examine_folder`/`select_folder` call.
#[async_trait]
pub trait ImapSession: Send {
    async fn list_folders(&mut self) -> Result<Vec<Folder>, ImapError>;

    /// Opens a folder read-only (EXAMINE).
    async fn examine_folder(&mut self, name: &str) -> Result<MailboxInfo, ImapError>;

    /// Opens a folder read-write (SELECT).
    async fn select_folder(&mut self, name: &str) -> Result<MailboxInfo, ImapError>;

    /// Returns matching UIDs in ascending order.
    async fn search(&mut self, query: &SearchQuery) -> Result<Vec<u32>, ImapError>;

    /// Fetches flags, dates and the header block of each message.
    async fn fetch_headers(&mut self, uids: &[u32]) -> Result<Vec<RawMessage>, ImapError>;

    /// Fetches the full source of one message, `None` if the UID is unknown.
    async fn fetch_message(&mut self, uid: u32) -> Result<Option<RawMessage>, ImapError>;

    async fn store_flags(
        &mut self,
        uids: &[u32],
        operation: StoreOperation,
        flags: &[MessageFlag],
    ) -> Result<(), ImapError>;

    async fn move_messages(&mut self, uids: &[u32], destination: &str) -> Result<(), ImapError>;

    /// Permanently removes the given UIDs if they carry `\Deleted`.
    async fn expunge(&mut self, uids: &[u32]) -> Result<(), ImapError>;

    async fn logout(&mut self) -> Result<(), ImapError>;
}

/// `ImapSession` over a real `async_imap` connection.
pub struct AsyncImapSessionWrapper {
    session: TlsImapSession,
}

impl AsyncImapSessionWrapper {
    pub fn new(session: TlsImapSession) -> Self {
        Self { session }
    }
}

fn folder_open_error(name: &str, err: async_imap::error::Error) -> ImapError {
    match ImapError::from(err) {
        ImapError::Operation(_) => ImapError::FolderNotFound(name.to_string()),
        other => other,
    }
}

/// `NO [TRYCREATE]` on MOVE/COPY means the destination does not exist.
fn move_error(destination: &str, err: ImapError) -> ImapError {
    match err {
        ImapError::Operation(msg) if msg.to_ascii_uppercase().contains("TRYCREATE") => {
            ImapError::FolderNotFound(destination.to_string())
        }
        other => other,
    }
}

/// Drops unsolicited FETCH responses for messages that were not asked for.
fn only_requested(messages: Vec<RawMessage>, uids: &[u32]) -> Vec<RawMessage> {
    let requested: HashSet<u32> = uids.iter().copied().collect();
    messages
        .into_iter()
        .filter(|m| requested.contains(&m.uid))
        .collect()
}

fn to_mailbox_info(mailbox: Mailbox) -> MailboxInfo {
    MailboxInfo {
        exists: mailbox.exists,
        unseen: mailbox.unseen,
        uid_validity: mailbox.uid_validity,
        uid_next: mailbox.uid_next,
    }
}

fn to_folder(name: &Name) -> Folder {
    let attributes = name.attributes();
    Folder {
        name: name.name().to_string(),
        delimiter: name.delimiter().map(|d| d.to_string()),
        attributes: attributes.iter().map(|a| format!("{:?}", a)).collect(),
        selectable: !attributes.iter().any(|a| matches!(a, NameAttribute::NoSelect)),
    }
}

fn to_message_flag(flag: Flag<'_>) -> Option<MessageFlag> {
    match flag {
        Flag::Seen => Some(MessageFlag::Seen),
        Flag::Answered => Some(MessageFlag::Answered),
        Flag::Flagged => Some(MessageFlag::Flagged),
        Flag::Deleted => Some(MessageFlag::Deleted),
        Flag::Draft => Some(MessageFlag::Draft),
        Flag::Custom(name) => Some(MessageFlag::parse(&name)),
        // \Recent and \* are session state, not message state
        _ => None,
    }
}

fn to_raw_message(fetch: &Fetch, full: bool) -> Option<RawMessage> {
    let uid = fetch.uid?;
    let content = if full { fetch.body() } else { fetch.header() };
    Some(RawMessage {
        uid,
        flags: fetch.flags().filter_map(to_message_flag).collect(),
        internal_date: fetch.internal_date(),
        size: fetch.size,
        content: content.map(|c| c.to_vec()).unwrap_or_default(),
    })
}

#[async_trait]
impl ImapSession for AsyncImapSessionWrapper {
    async fn list_folders(&mut self) -> Result<Vec<Folder>, ImapError> {
        let names: Vec<Name> = self
            .session
            .list(Some(""), Some("*"))
            .await?
            .try_collect()
            .await?;
        Ok(names.iter().map(to_folder).collect())
    }

    async fn examine_folder(&mut self, name: &str) -> Result<MailboxInfo, ImapError> {
        debug!("EXAMINE {}", name);
        self.session
            .examine(name)
            .await
            .map(to_mailbox_info)
            .map_err(|e| folder_open_error(name, e))
    }

    async fn select_folder(&mut self, name: &str) -> Result<MailboxInfo, ImapError> {
        debug!("SELECT {}", name);
        self.session
            .select(name)
            .await
            .map(to_mailbox_info)
            .map_err(|e| folder_open_error(name, e))
    }

    async fn search(&mut self, query: &SearchQuery) -> Result<Vec<u32>, ImapError> {
        let rendered = query.to_imap();
        debug!("UID SEARCH {}", rendered);
        let mut uids: Vec<u32> = self.session.uid_search(&rendered).await?.into_iter().collect();
        uids.sort_unstable();
        Ok(uids)
    }

    async fn fetch_headers(&mut self, uids: &[u32]) -> Result<Vec<RawMessage>, ImapError> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }
        let uid_set = format_uid_set(uids);
        debug!("UID FETCH {} headers", uid_set);
        let fetches: Vec<Fetch> = self
            .session
            .uid_fetch(&uid_set, HEADER_FETCH_QUERY)
            .await?
            .try_collect()
            .await?;
        let messages = fetches.iter().filter_map(|f| to_raw_message(f, false)).collect();
        Ok(only_requested(messages, uids))
    }

    async fn fetch_message(&mut self, uid: u32) -> Result<Option<RawMessage>, ImapError> {
        debug!("UID FETCH {} full", uid);
        let fetches: Vec<Fetch> = self
            .session
            .uid_fetch(&uid.to_string(), FULL_FETCH_QUERY)
            .await?
            .try_collect()
            .await?;
        // Servers may push unsolicited FETCH responses for other messages
        Ok(fetches
            .iter()
            .filter(|f| f.uid == Some(uid))
            .find_map(|f| to_raw_message(f, true)))
    }

    async fn store_flags(
        &mut self,
        uids: &[u32],
        operation: StoreOperation,
        flags: &[MessageFlag],
    ) -> Result<(), ImapError> {
        if uids.is_empty() {
            return Ok(());
        }
        let uid_set = format_uid_set(uids);
        let query = format!("{} {}", operation.command(), format_flag_list(flags));
        debug!("UID STORE {} {}", uid_set, query);
        let _: Vec<Fetch> = self.session.uid_store(&uid_set, &query).await?.try_collect().await?;
        Ok(())
    }

    async fn move_messages(&mut self, uids: &[u32], destination: &str) -> Result<(), ImapError> {
        if uids.is_empty() {
            return Ok(());
        }
        let uid_set = format_uid_set(uids);
        match self.session.uid_mv(&uid_set, destination).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let err = move_error(destination, ImapError::from(e));
                if !err.is_rejection() {
                    return Err(err);
                }
                // No MOVE extension: copy, flag, expunge
                warn!("UID MOVE rejected ({}), falling back to COPY + EXPUNGE", err);
                self.session
                    .uid_copy(&uid_set, destination)
                    .await
                    .map_err(|e| move_error(destination, ImapError::from(e)))?;
                self.store_flags(uids, StoreOperation::Add, &[MessageFlag::Deleted]).await?;
                self.expunge(uids).await
            }
        }
    }

    async fn expunge(&mut self, uids: &[u32]) -> Result<(), ImapError> {
        if uids.is_empty() {
            return Ok(());
        }
        let uid_set = format_uid_set(uids);
        debug!("UID EXPUNGE {}", uid_set);
        let _: Vec<u32> = self.session.uid_expunge(&uid_set).await?.try_collect().await?;
        Ok(())
    }

    async fn logout(&mut self) -> Result<(), ImapError> {
        self.session.logout().await.map_err(ImapError::from)
    }
}
