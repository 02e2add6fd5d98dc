// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

pub mod client;
pub mod error;
pub mod session;
pub mod types;

use futures_util::future::BoxFuture;
use std::sync::Arc;

use crate::imap::{error::ImapError, session::ImapSession};

/// Type alias for a factory function that opens new IMAP sessions.
///
/// Each call connects and logs in; the caller owns the returned session and
/// is expected to log out when done.
pub type ImapSessionFactory =
    Arc<dyn Fn() -> BoxFuture<'static, Result<Box<dyn ImapSession>, ImapError>> + Send + Sync>;
