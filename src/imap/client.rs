// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use async_imap::Client as AsyncImapClient;
use futures_util::FutureExt;
use rustls::pki_types::ServerName as PkiServerName;
use rustls::{ClientConfig, RootCertStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream as TokioTcpStream;
use tokio::time::timeout;
use tokio_rustls::{client::TlsStream as TokioTlsStreamClient, TlsConnector};
use tokio_util::compat::TokioAsyncReadCompatExt;

use crate::config::Settings;
use crate::imap::{
    error::ImapError,
    session::{AsyncImapSessionWrapper, ImapSession, TlsCompatibleStream, TlsImapSession},
    ImapSessionFactory,
};

/// Connection parameters for one IMAP account.
#[derive(Clone)]
pub struct ImapConnectionParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for ImapConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImapConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl From<&Settings> for ImapConnectionParams {
    fn from(settings: &Settings) -> Self {
        Self {
            host: settings.imap_host.clone(),
            port: settings.imap_port,
            username: settings.imap_user.clone(),
            password: settings.imap_pass.clone(),
            timeout: Duration::from_secs(settings.imap_timeout_secs),
        }
    }
}

fn build_tls_connector() -> Result<TlsConnector, ImapError> {
    let mut root_cert_store = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs()
        .map_err(|e| ImapError::Tls(format!("Failed to load native certs: {}", e)))?;
    let (added, ignored) = root_cert_store.add_parsable_certificates(certs);
    log::debug!("Loaded {} native certs, ignored {}.", added, ignored);
    if root_cert_store.is_empty() {
        log::warn!("Root certificate store is empty after loading native certs.");
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ImapError::Tls(e.to_string()))?
        .with_root_certificates(root_cert_store)
        .with_no_client_auth();
    Ok(TlsConnector::from(Arc::new(config)))
}

/// Establishes TCP connection and performs the TLS handshake.
async fn setup_tls_stream(
    host: &str,
    port: u16,
    tls_connector: &TlsConnector,
) -> Result<TokioTlsStreamClient<TokioTcpStream>, ImapError> {
    let server_name = PkiServerName::try_from(host.to_string())
        .map_err(|_| ImapError::Connection(format!("Invalid server name format: {}", host)))?;

    log::debug!("Attempting TCP connection to {}:{}...", host, port);
    let tcp_stream = TokioTcpStream::connect((host, port)).await?;
    log::debug!("TCP connected. Performing TLS handshake...");

    let tls_stream = tls_connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(|e| ImapError::Tls(e.to_string()))?;
    log::debug!("TLS handshake successful.");
    Ok(tls_stream)
}

async fn perform_imap_login(
    compat_stream: TlsCompatibleStream,
    username: &str,
    password: &str,
) -> Result<TlsImapSession, ImapError> {
    let client = AsyncImapClient::new(compat_stream);
    log::debug!("IMAP client created. Attempting login for user '{}'...", username);

    match client.login(username, password).await {
        Ok(session) => {
            log::debug!("IMAP login successful for user: {}", username);
            Ok(session)
        }
        Err((e, _client)) => {
            log::error!("IMAP login failed for user {}: {:?}", username, e);
            Err(ImapError::Auth(e.to_string()))
        }
    }
}

/// Connects, performs the TLS handshake and logs in, all bounded by the
/// configured timeout.
pub async fn connect(
    params: &ImapConnectionParams,
    tls_connector: &TlsConnector,
) -> Result<Box<dyn ImapSession>, ImapError> {
    log::debug!("Opening IMAP session to {}:{}", params.host, params.port);
    let attempt = async {
        let tls_stream = setup_tls_stream(&params.host, params.port, tls_connector).await?;
        perform_imap_login(tls_stream.compat(), &params.username, &params.password).await
    };

    match timeout(params.timeout, attempt).await {
        Ok(Ok(session)) => Ok(Box::new(AsyncImapSessionWrapper::new(session))),
        Ok(Err(e)) => Err(e),
        Err(_) => {
            log::error!(
                "IMAP connection to {}:{} timed out after {:?}",
                params.host,
                params.port,
                params.timeout
            );
            Err(ImapError::Timeout(format!(
                "connect/login to {}:{}",
                params.host, params.port
            )))
        }
    }
}

/// Creates a factory that opens a fresh, logged-in session on every call.
pub fn create_imap_factory(settings: &Settings) -> Result<ImapSessionFactory, ImapError> {
    let tls_connector = Arc::new(build_tls_connector()?);
    let params = Arc::new(ImapConnectionParams::from(settings));

    Ok(Arc::new(move || {
        let tls_connector = tls_connector.clone();
        let params = params.clone();
        async move { connect(&params, &tls_connector).await }.boxed()
    }))
}
