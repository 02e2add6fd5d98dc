// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use config::{Environment, File};
use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. `*` allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderConfig {
    pub inbox: String,
    pub sent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub log: LogConfig,
    pub imap_host: String,
    pub imap_port: u16,
    pub imap_user: String,
    pub imap_pass: String,
    pub imap_timeout_secs: u64,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub smtp_starttls: bool,
    #[serde(default)]
    pub mail_from: String,
    pub rest: RestConfig,
    pub attachments: AttachmentConfig,
    pub folders: FolderConfig,
}

/// Direct environment variables and the setting each one overrides.
const DIRECT_ENV_VARS: &[(&str, &str)] = &[
    ("IMAP_HOST", "imap_host"),
    ("IMAP_PORT", "imap_port"),
    ("IMAP_USER", "imap_user"),
    ("IMAP_PASS", "imap_pass"),
    ("SMTP_HOST", "smtp_host"),
    ("SMTP_PORT", "smtp_port"),
    ("SMTP_USER", "smtp_user"),
    ("SMTP_PASS", "smtp_pass"),
    ("SMTP_STARTTLS", "smtp_starttls"),
    ("MAIL_FROM", "mail_from"),
    ("REST_HOST", "rest.host"),
    ("REST_PORT", "rest.port"),
    ("ATTACHMENTS_DIR", "attachments.dir"),
    ("LOG_LEVEL", "log.level"),
];

const PORT_VARS: &[&str] = &["IMAP_PORT", "SMTP_PORT", "REST_PORT"];
const BOOL_VARS: &[&str] = &["SMTP_STARTTLS"];

/// Where attachments land when nothing is configured.
pub fn default_attachment_dir() -> PathBuf {
    dirs::download_dir()
        .map(|dir| dir.join("simplemail"))
        .unwrap_or_else(|| PathBuf::from("attachments"))
}

impl Settings {
    pub fn new(config_path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut config_builder = config::Config::builder()
            // IMAP defaults
            .set_default("imap_host", "localhost")?
            .set_default("imap_port", 993)?
            .set_default("imap_user", "")?
            .set_default("imap_pass", "")?
            .set_default("imap_timeout_secs", 30)?

            // SMTP defaults
            .set_default("smtp_host", "localhost")?
            .set_default("smtp_port", 587)?
            .set_default("smtp_user", "")?
            .set_default("smtp_pass", "")?
            .set_default("smtp_starttls", true)?
            .set_default("mail_from", "")?

            // REST defaults
            .set_default("rest.host", "127.0.0.1")?
            .set_default("rest.port", 8080)?
            .set_default("rest.allowed_origins", Vec::<String>::new())?

            .set_default(
                "attachments.dir",
                default_attachment_dir().to_string_lossy().to_string(),
            )?
            .set_default("folders.inbox", "INBOX")?
            .set_default("folders.sent", "Sent")?
            .set_default("log.level", "info")?;

        if let Some(path) = config_path {
            config_builder = config_builder.add_source(File::with_name(path));
        }

        // e.g. `SIMPLEMAIL__REST__PORT=9000` overrides `rest.port`
        config_builder = config_builder.add_source(
            Environment::with_prefix("SIMPLEMAIL")
                .prefix_separator("__")
                .separator("__")
                .ignore_empty(true),
        );

        for (env_var, key) in DIRECT_ENV_VARS {
            let Ok(value) = env::var(env_var) else {
                continue;
            };
            if PORT_VARS.contains(env_var) {
                match value.parse::<u16>() {
                    Ok(port) => config_builder = config_builder.set_override(*key, port)?,
                    Err(_) => warn!("Invalid port value in {}: {}", env_var, value),
                }
            } else if BOOL_VARS.contains(env_var) {
                match value.parse::<bool>() {
                    Ok(enabled) => config_builder = config_builder.set_override(*key, enabled)?,
                    Err(_) => warn!("Invalid boolean value in {}: {}", env_var, value),
                }
            } else {
                config_builder = config_builder.set_override(*key, value)?;
            }
        }

        config_builder.build()?.try_deserialize()
    }

    /// Address used in the `From:` header of outgoing mail.
    pub fn smtp_sender(&self) -> &str {
        if self.mail_from.trim().is_empty() {
            &self.imap_user
        } else {
            &self.mail_from
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig { level: "info".to_string() }
    }
}

impl Default for RestConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            allowed_origins: Vec::new(),
        }
    }
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self { dir: default_attachment_dir() }
    }
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            inbox: "INBOX".to_string(),
            sent: "Sent".to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log: LogConfig::default(),
            imap_host: "localhost".to_string(),
            imap_port: 993,
            imap_user: String::new(),
            imap_pass: String::new(),
            imap_timeout_secs: 30,
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_pass: String::new(),
            smtp_starttls: true,
            mail_from: String::new(),
            rest: RestConfig::default(),
            attachments: AttachmentConfig::default(),
            folders: FolderConfig::default(),
        }
    }
}
