// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use async_trait::async_trait;
use lettre::message::header::{self, ContentType};
use lettre::message::{Mailbox, MultiPart, SinglePart};
use lettre::{
    transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport, Message,
    Tokio1Executor,
};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

use crate::api::validation::validators;
use crate::config::Settings;

#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("SMTP configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Email building error: {0}")]
    BuildError(#[from] lettre::error::Error),

    #[error("Email sending error: {0}")]
    SendError(String),
}

impl From<lettre::transport::smtp::Error> for SmtpError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        SmtpError::SendError(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendEmailRequest {
    #[validate(custom(function = "validators::validate_recipients"))]
    pub to: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validators::validate_optional_recipients"))]
    pub cc: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = "validators::validate_optional_recipients"))]
    pub bcc: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub html: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message_id: Option<String>,
    pub message: String,
}

/// Something that can deliver a finished message.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: Message) -> Result<(), SmtpError>;
}

/// SMTP relay built from the configured credentials.
pub struct LettreTransport {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl LettreTransport {
    pub fn from_settings(settings: &Settings) -> Result<Self, SmtpError> {
        let builder = if settings.smtp_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host)
        }
        .map_err(|e| SmtpError::ConfigError(format!("SMTP relay error: {}", e)))?;

        let mut builder = builder.port(settings.smtp_port);
        if !settings.smtp_user.is_empty() {
            builder = builder.credentials(Credentials::new(
                settings.smtp_user.clone(),
                settings.smtp_pass.clone(),
            ));
        }

        Ok(Self { mailer: builder.build() })
    }
}

#[async_trait]
impl MailTransport for LettreTransport {
    async fn send(&self, message: Message) -> Result<(), SmtpError> {
        self.mailer.send(message).await?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, SmtpError> {
    address.trim().parse().map_err(|e: lettre::address::AddressError| SmtpError::InvalidAddress {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

pub struct SmtpService {
    sender: String,
    transport: Arc<dyn MailTransport>,
}

impl SmtpService {
    pub fn new(sender: impl Into<String>, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            sender: sender.into(),
            transport,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SmtpError> {
        let transport = LettreTransport::from_settings(settings)?;
        Ok(Self::new(settings.smtp_sender(), Arc::new(transport)))
    }

    /// Builds the MIME message: plain text, or multipart/alternative when an
    /// HTML body is supplied.
    pub fn build_message(&self, request: &SendEmailRequest) -> Result<Message, SmtpError> {
        if self.sender.trim().is_empty() {
            return Err(SmtpError::ConfigError("No sender address configured".to_string()));
        }

        let mut email_builder = Message::builder()
            .from(parse_mailbox(&self.sender)?)
            .subject(&request.subject);

        for to_addr in &request.to {
            email_builder = email_builder.to(parse_mailbox(to_addr)?);
        }
        for cc_addr in &request.cc {
            email_builder = email_builder.cc(parse_mailbox(cc_addr)?);
        }
        for bcc_addr in &request.bcc {
            email_builder = email_builder.bcc(parse_mailbox(bcc_addr)?);
        }

        let email = match &request.html {
            Some(html_body) => email_builder.multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_PLAIN)
                            .body(request.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(header::ContentType::TEXT_HTML)
                            .body(html_body.clone()),
                    ),
            )?,
            None => email_builder
                .header(ContentType::TEXT_PLAIN)
                .body(request.text.clone())?,
        };

        Ok(email)
    }

    pub async fn send_email(&self, request: &SendEmailRequest) -> Result<SendEmailResponse, SmtpError> {
        let email = self.build_message(request)?;
        let message_id = email
            .headers()
            .get_raw("Message-ID")
            .map(|v| v.to_string());

        debug!(
            "Sending '{}' to {} recipient(s)",
            request.subject,
            request.to.len() + request.cc.len() + request.bcc.len()
        );
        if let Err(e) = self.transport.send(email).await {
            error!("Failed to send email '{}': {}", request.subject, e);
            return Err(e);
        }
        info!("Email '{}' sent", request.subject);

        Ok(SendEmailResponse {
            success: true,
            message_id,
            message: "Email sent successfully!".to_string(),
        })
    }
}
