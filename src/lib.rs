// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Library core for SimpleMail: a REST façade over one IMAP/SMTP mailbox.

pub mod api;
pub mod config;
pub mod error;
pub mod imap;
pub mod models;
pub mod services;
pub mod utils;

pub mod prelude {
    pub use crate::api::rest::AppState;
    pub use crate::config::Settings;
    pub use crate::error::MailError;
    pub use crate::imap::error::ImapError;
    pub use crate::imap::session::ImapSession;
    pub use crate::imap::types::{Folder, MessageFlag, RawMessage, SearchField, SearchQuery};
    pub use crate::imap::ImapSessionFactory;
    pub use crate::services::email::EmailService;
    pub use crate::services::smtp::{SendEmailRequest, SmtpService};
}
