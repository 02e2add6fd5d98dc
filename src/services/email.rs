// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mailbox operations. Each public method opens its own IMAP session through
//! the factory, runs to completion and logs out again.

use log::{debug, info, warn};
use std::path::PathBuf;

use crate::config::Settings;
use crate::error::MailError;
use crate::imap::{
    session::ImapSession,
    types::{Folder, MessageFlag, RawMessage, SearchField, SearchQuery, StoreOperation},
    ImapSessionFactory,
};
use crate::models::email::{EmailDetail, EmailSummary, SavedAttachment, SentEmailSummary};
use crate::services::attachment_storage;
use crate::utils::email_parser;

pub const DEFAULT_LATEST_COUNT: usize = 3;
pub const DEFAULT_SENT_COUNT: usize = 20;
pub const DEFAULT_PAGE_LIMIT: usize = 50;

pub struct EmailService {
    factory: ImapSessionFactory,
    inbox_folder: String,
    sent_folder: String,
    attachment_dir: PathBuf,
}

/// Newest `limit` UIDs after skipping `offset`, newest first.
fn newest_page(mut uids: Vec<u32>, limit: usize, offset: usize) -> Vec<u32> {
    uids.sort_unstable_by(|a, b| b.cmp(a));
    uids.into_iter().skip(offset).take(limit).collect()
}

/// Servers answer FETCH in sequence order; pages are always newest first.
fn newest_first(mut messages: Vec<RawMessage>) -> Vec<RawMessage> {
    messages.sort_unstable_by(|a, b| b.uid.cmp(&a.uid));
    messages
}

impl EmailService {
    pub fn new(
        factory: ImapSessionFactory,
        inbox_folder: impl Into<String>,
        sent_folder: impl Into<String>,
        attachment_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            factory,
            inbox_folder: inbox_folder.into(),
            sent_folder: sent_folder.into(),
            attachment_dir: attachment_dir.into(),
        }
    }

    pub fn from_settings(factory: ImapSessionFactory, settings: &Settings) -> Self {
        Self::new(
            factory,
            settings.folders.inbox.clone(),
            settings.folders.sent.clone(),
            settings.attachments.dir.clone(),
        )
    }

    async fn open(&self) -> Result<Box<dyn ImapSession>, MailError> {
        debug!("Opening IMAP session");
        Ok((self.factory)().await?)
    }

    async fn close(&self, mut session: Box<dyn ImapSession>) {
        if let Err(e) = session.logout().await {
            warn!("IMAP logout failed: {}", e);
        }
    }

    pub async fn list_folders(&self) -> Result<Vec<Folder>, MailError> {
        let mut session = self.open().await?;
        let result = session.list_folders().await.map_err(MailError::from);
        self.close(session).await;

        let folders = result?;
        info!("Listed {} folders", folders.len());
        Ok(folders)
    }

    async fn summaries(
        &self,
        session: &mut dyn ImapSession,
        folder: &str,
        query: &SearchQuery,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<EmailSummary>, MailError> {
        session.examine_folder(folder).await?;
        let uids = newest_page(session.search(query).await?, limit, offset);
        debug!("'{}' {} -> {} UIDs on page", folder, query, uids.len());

        let messages = session.fetch_headers(&uids).await?;
        Ok(newest_first(messages)
            .iter()
            .map(email_parser::to_summary)
            .collect())
    }

    async fn list_with(
        &self,
        folder: &str,
        query: SearchQuery,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<EmailSummary>, MailError> {
        let mut session = self.open().await?;
        let result = self
            .summaries(session.as_mut(), folder, &query, limit, offset)
            .await;
        self.close(session).await;

        let summaries = result?;
        info!("Fetched {} emails from '{}'", summaries.len(), folder);
        Ok(summaries)
    }

    pub async fn fetch_folder(
        &self,
        folder: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<EmailSummary>, MailError> {
        self.list_with(folder, SearchQuery::All, limit, offset).await
    }

    pub async fn fetch_latest(&self, count: usize) -> Result<Vec<EmailSummary>, MailError> {
        self.list_with(&self.inbox_folder, SearchQuery::All, count, 0)
            .await
    }

    pub async fn fetch_by_read_status(
        &self,
        folder: &str,
        seen: bool,
    ) -> Result<Vec<EmailSummary>, MailError> {
        self.list_with(folder, SearchQuery::Seen(seen), usize::MAX, 0)
            .await
    }

    pub async fn search(
        &self,
        folder: &str,
        keyword: &str,
        field: SearchField,
    ) -> Result<Vec<EmailSummary>, MailError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(MailError::Validation("Search keyword must not be empty".to_string()));
        }
        self.list_with(
            folder,
            SearchQuery::Field(field, keyword.to_string()),
            usize::MAX,
            0,
        )
        .await
    }

    pub async fn fetch_sent(&self, count: usize) -> Result<Vec<SentEmailSummary>, MailError> {
        let mut session = self.open().await?;
        let result = async {
            session.examine_folder(&self.sent_folder).await?;
            let uids = newest_page(session.search(&SearchQuery::All).await?, count, 0);
            let messages = session.fetch_headers(&uids).await?;
            Ok::<_, MailError>(newest_first(messages))
        }
        .await;
        self.close(session).await;

        let sent: Vec<SentEmailSummary> = result?
            .iter()
            .map(email_parser::to_sent_summary)
            .collect();
        info!("Fetched {} sent emails from '{}'", sent.len(), self.sent_folder);
        Ok(sent)
    }

    /// Full message source, read without touching `\Seen`.
    async fn fetch_raw(&self, folder: &str, uid: u32) -> Result<RawMessage, MailError> {
        let mut session = self.open().await?;
        let result = async {
            session.examine_folder(folder).await?;
            Ok::<_, MailError>(session.fetch_message(uid).await?)
        }
        .await;
        self.close(session).await;

        result?.ok_or_else(|| MailError::EmailNotFound {
            folder: folder.to_string(),
            uid,
        })
    }

    pub async fn get_email(&self, folder: &str, uid: u32) -> Result<EmailDetail, MailError> {
        let raw = self.fetch_raw(folder, uid).await?;
        let detail = email_parser::to_detail(&raw)?;
        info!(
            "Fetched UID {} from '{}' ({} attachments)",
            uid,
            folder,
            detail.attachments.len()
        );
        Ok(detail)
    }

    pub async fn get_html_content(&self, folder: &str, uid: u32) -> Result<String, MailError> {
        let raw = self.fetch_raw(folder, uid).await?;
        email_parser::html_content(&raw)?.ok_or_else(|| MailError::HtmlContentNotFound {
            folder: folder.to_string(),
            uid,
        })
    }

    pub async fn update_read_status(
        &self,
        folder: &str,
        uids: &[u32],
        seen: bool,
    ) -> Result<(), MailError> {
        let operation = if seen {
            StoreOperation::Add
        } else {
            StoreOperation::Remove
        };

        let mut session = self.open().await?;
        let result = async {
            session.select_folder(folder).await?;
            session
                .store_flags(uids, operation, &[MessageFlag::Seen])
                .await?;
            Ok::<_, MailError>(())
        }
        .await;
        self.close(session).await;

        result?;
        info!(
            "Marked {} email(s) in '{}' as {}",
            uids.len(),
            folder,
            if seen { "read" } else { "unread" }
        );
        Ok(())
    }

    /// Flags the messages `\Deleted` and expunges exactly those UIDs.
    /// Returns how many of the requested UIDs existed.
    pub async fn delete(&self, folder: &str, uids: &[u32]) -> Result<usize, MailError> {
        let mut session = self.open().await?;
        let result = async {
            session.select_folder(folder).await?;
            let existing: Vec<u32> = session
                .search(&SearchQuery::All)
                .await?
                .into_iter()
                .filter(|uid| uids.contains(uid))
                .collect();
            if existing.is_empty() {
                return Ok::<_, MailError>(0);
            }
            session
                .store_flags(&existing, StoreOperation::Add, &[MessageFlag::Deleted])
                .await?;
            session.expunge(&existing).await?;
            Ok(existing.len())
        }
        .await;
        self.close(session).await;

        let deleted = result?;
        info!("Deleted {} of {} email(s) from '{}'", deleted, uids.len(), folder);
        Ok(deleted)
    }

    /// Moves messages between folders. Returns how many of the requested UIDs
    /// existed in the source folder.
    pub async fn move_messages(
        &self,
        source: &str,
        uids: &[u32],
        destination: &str,
    ) -> Result<usize, MailError> {
        let mut session = self.open().await?;
        let result = async {
            session.select_folder(source).await?;
            let existing: Vec<u32> = session
                .search(&SearchQuery::All)
                .await?
                .into_iter()
                .filter(|uid| uids.contains(uid))
                .collect();
            session.move_messages(&existing, destination).await?;
            Ok::<_, MailError>(existing.len())
        }
        .await;
        self.close(session).await;

        let moved = result?;
        info!("Moved {} email(s) from '{}' to '{}'", moved, source, destination);
        Ok(moved)
    }

    pub async fn save_attachment(
        &self,
        folder: &str,
        uid: u32,
        index: usize,
    ) -> Result<SavedAttachment, MailError> {
        let raw = self.fetch_raw(folder, uid).await?;
        let attachments = email_parser::extract_attachments(&raw)?;
        let (attachment, filename) = attachment_storage::select_attachment(attachments, index)?;
        Ok(
            attachment_storage::save_attachment(&self.attachment_dir, folder, uid, &attachment, &filename)
                .await?,
        )
    }

    pub async fn save_all_attachments(
        &self,
        folder: &str,
        uid: u32,
    ) -> Result<Vec<SavedAttachment>, MailError> {
        let raw = self.fetch_raw(folder, uid).await?;
        let mut saved = Vec::new();
        let attachments = email_parser::extract_attachments(&raw)?;
        for (attachment, filename) in attachment_storage::with_stored_filenames(attachments) {
            saved.push(
                attachment_storage::save_attachment(&self.attachment_dir, folder, uid, &attachment, &filename)
                    .await?,
            );
        }
        info!("Saved {} attachment(s) of UID {} in '{}'", saved.len(), uid, folder);
        Ok(saved)
    }
}
