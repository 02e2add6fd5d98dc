// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use actix_cors::Cors;
use actix_web::{
    delete, get,
    http::header,
    middleware::Logger,
    post,
    web::{self, Data, Json, Path, Query},
    App, HttpResponse, HttpServer,
};
use log::info;
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    api::{
        errors::ApiError,
        validation::{
            check_param, check_uid, validate_payload, validators, DeleteRequest, MoveRequest,
            ReadStatusUpdateRequest,
        },
    },
    config::{RestConfig, Settings},
    imap::types::SearchField,
    models::email::{DeleteResponse, MoveResponse, StatusResponse},
    services::{
        email::{EmailService, DEFAULT_LATEST_COUNT, DEFAULT_PAGE_LIMIT, DEFAULT_SENT_COUNT},
        smtp::{SendEmailRequest, SmtpService},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub email_service: Arc<EmailService>,
    pub smtp_service: Arc<SmtpService>,
}

// --- Query parameters ---

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderQuery {
    pub folder_name: String,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ReadStatusQuery {
    pub folder: String,
    pub seen: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderNameQuery {
    pub folder_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentQuery {
    pub folder_name: String,
    pub uid: u32,
    pub attachment_index: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageQuery {
    pub folder_name: String,
    pub uid: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub folder_name: String,
    pub keyword: String,
    pub search_field: SearchField,
}

fn check_folder(param: &str, folder: &str) -> Result<(), ApiError> {
    check_param(param, folder, validators::validate_folder_name)
}

fn read_status_label(seen: bool) -> &'static str {
    if seen {
        "read"
    } else {
        "unread"
    }
}

pub fn configure_rest_service(cfg: &mut web::ServiceConfig) {
    // Extractor failures use the same JSON error body as handler errors
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _req| {
        ApiError::bad_request(err.to_string()).into()
    }))
    .app_data(web::JsonConfig::default().error_handler(|err, _req| {
        ApiError::bad_request(err.to_string()).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        ApiError::bad_request(err.to_string()).into()
    }));

    cfg.service(
        web::scope("/api/email")
            // Listing
            .service(list_folders)
            .service(fetch_inbox)
            .service(fetch_folder)
            .service(fetch_by_read_status)
            .service(fetch_outbox)
            .service(search_emails)
            // Single message
            .service(fetch_html_content)
            .service(fetch_email)
            .service(save_attachment)
            .service(save_all_attachments)
            // Mutations
            .service(send_email)
            .service(update_read_status)
            .service(update_read_status_multiple)
            .service(move_emails)
            .service(delete_email)
            .service(delete_emails),
    );
}

// --- Route Handlers ---

#[get("/folders")]
async fn list_folders(state: Data<AppState>) -> Result<HttpResponse, ApiError> {
    info!("Handling GET /api/email/folders");
    let folders = state.email_service.list_folders().await?;
    Ok(HttpResponse::Ok().json(folders))
}

#[get("/inbox")]
async fn fetch_inbox(state: Data<AppState>, query: Query<CountQuery>) -> Result<HttpResponse, ApiError> {
    info!("Handling GET /api/email/inbox");
    let count = query.count.unwrap_or(DEFAULT_LATEST_COUNT);
    let emails = state.email_service.fetch_latest(count).await?;
    Ok(HttpResponse::Ok().json(emails))
}

#[get("/folder")]
async fn fetch_folder(state: Data<AppState>, query: Query<FolderQuery>) -> Result<HttpResponse, ApiError> {
    info!("Handling GET /api/email/folder for '{}'", query.folder_name);
    check_folder("folderName", &query.folder_name)?;
    let (limit, offset) =
        validators::validate_pagination(query.limit, query.offset, DEFAULT_PAGE_LIMIT).map_err(
            |e| ApiError::bad_request(format!("Invalid pagination: {}", e.code)),
        )?;

    let emails = state
        .email_service
        .fetch_folder(&query.folder_name, limit, offset)
        .await?;
    Ok(HttpResponse::Ok().json(emails))
}

#[get("/folder/read-status")]
async fn fetch_by_read_status(
    state: Data<AppState>,
    query: Query<ReadStatusQuery>,
) -> Result<HttpResponse, ApiError> {
    info!(
        "Handling GET /api/email/folder/read-status for '{}' (seen={})",
        query.folder, query.seen
    );
    check_folder("folder", &query.folder)?;
    let emails = state
        .email_service
        .fetch_by_read_status(&query.folder, query.seen)
        .await?;
    Ok(HttpResponse::Ok().json(emails))
}

#[get("/outbox")]
async fn fetch_outbox(state: Data<AppState>, query: Query<CountQuery>) -> Result<HttpResponse, ApiError> {
    info!("Handling GET /api/email/outbox");
    let count = query.count.unwrap_or(DEFAULT_SENT_COUNT);
    let emails = state.email_service.fetch_sent(count).await?;
    Ok(HttpResponse::Ok().json(emails))
}

#[get("/search")]
async fn search_emails(state: Data<AppState>, query: Query<SearchParams>) -> Result<HttpResponse, ApiError> {
    info!(
        "Handling GET /api/email/search in '{}' on {}",
        query.folder_name,
        query.search_field.keyword()
    );
    check_folder("folderName", &query.folder_name)?;
    let emails = state
        .email_service
        .search(&query.folder_name, &query.keyword, query.search_field)
        .await?;
    Ok(HttpResponse::Ok().json(emails))
}

#[get("/fetch/html-content/{uid}")]
async fn fetch_html_content(
    state: Data<AppState>,
    path: Path<u32>,
    query: Query<FolderNameQuery>,
) -> Result<HttpResponse, ApiError> {
    let uid = path.into_inner();
    info!("Handling GET /api/email/fetch/html-content/{}", uid);
    check_uid(uid)?;
    check_folder("folderName", &query.folder_name)?;

    let html = state
        .email_service
        .get_html_content(&query.folder_name, uid)
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/html; charset=utf-8"))
        .body(html))
}

#[get("/fetch/{uid}")]
async fn fetch_email(
    state: Data<AppState>,
    path: Path<u32>,
    query: Query<FolderNameQuery>,
) -> Result<HttpResponse, ApiError> {
    let uid = path.into_inner();
    info!("Handling GET /api/email/fetch/{}", uid);
    check_uid(uid)?;
    check_folder("folderName", &query.folder_name)?;

    let email = state.email_service.get_email(&query.folder_name, uid).await?;
    Ok(HttpResponse::Ok().json(email))
}

#[get("/save-attachment")]
async fn save_attachment(
    state: Data<AppState>,
    query: Query<AttachmentQuery>,
) -> Result<HttpResponse, ApiError> {
    info!(
        "Handling GET /api/email/save-attachment for UID {} #{}",
        query.uid, query.attachment_index
    );
    check_uid(query.uid)?;
    check_folder("folderName", &query.folder_name)?;

    let saved = state
        .email_service
        .save_attachment(&query.folder_name, query.uid, query.attachment_index)
        .await?;
    Ok(HttpResponse::Ok().json(saved))
}

#[get("/save-all-attachments")]
async fn save_all_attachments(
    state: Data<AppState>,
    query: Query<MessageQuery>,
) -> Result<HttpResponse, ApiError> {
    info!("Handling GET /api/email/save-all-attachments for UID {}", query.uid);
    check_uid(query.uid)?;
    check_folder("folderName", &query.folder_name)?;

    let saved = state
        .email_service
        .save_all_attachments(&query.folder_name, query.uid)
        .await?;
    Ok(HttpResponse::Ok().json(saved))
}

#[post("/send")]
async fn send_email(
    state: Data<AppState>,
    payload: Json<SendEmailRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Handling POST /api/email/send");
    let request = validate_payload(payload.into_inner())?;
    let response = state.smtp_service.send_email(&request).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[post("/update-read-status/{uid}")]
async fn update_read_status(
    state: Data<AppState>,
    path: Path<u32>,
    query: Query<ReadStatusQuery>,
) -> Result<HttpResponse, ApiError> {
    let uid = path.into_inner();
    info!("Handling POST /api/email/update-read-status/{}", uid);
    check_uid(uid)?;
    check_folder("folder", &query.folder)?;

    state
        .email_service
        .update_read_status(&query.folder, &[uid], query.seen)
        .await?;
    Ok(HttpResponse::Ok().json(StatusResponse {
        message: format!("Email marked as {}", read_status_label(query.seen)),
    }))
}

#[post("/update-read-status-multiple")]
async fn update_read_status_multiple(
    state: Data<AppState>,
    payload: Json<ReadStatusUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Handling POST /api/email/update-read-status-multiple");
    let request = validate_payload(payload.into_inner())?;

    state
        .email_service
        .update_read_status(&request.folder_name, &request.uids, request.seen)
        .await?;
    Ok(HttpResponse::Ok().json(StatusResponse {
        message: format!(
            "{} email(s) marked as {}",
            request.uids.len(),
            read_status_label(request.seen)
        ),
    }))
}

#[post("/move")]
async fn move_emails(state: Data<AppState>, payload: Json<MoveRequest>) -> Result<HttpResponse, ApiError> {
    info!("Handling POST /api/email/move");
    let request = validate_payload(payload.into_inner())?;
    if request.source_folder == request.destination_folder {
        return Err(ApiError::bad_request("Source and destination folders are the same"));
    }

    let moved = state
        .email_service
        .move_messages(&request.source_folder, &request.uids, &request.destination_folder)
        .await?;
    Ok(HttpResponse::Ok().json(MoveResponse {
        message: format!(
            "Moved {} email(s) from '{}' to '{}'",
            moved, request.source_folder, request.destination_folder
        ),
        moved,
    }))
}

#[delete("/delete/{uid}")]
async fn delete_email(
    state: Data<AppState>,
    path: Path<u32>,
    query: Query<FolderNameQuery>,
) -> Result<HttpResponse, ApiError> {
    let uid = path.into_inner();
    info!("Handling DELETE /api/email/delete/{}", uid);
    check_uid(uid)?;
    check_folder("folderName", &query.folder_name)?;

    let deleted = state.email_service.delete(&query.folder_name, &[uid]).await?;
    if deleted == 0 {
        return Err(ApiError::EmailNotFound {
            folder: query.folder_name.clone(),
            uid,
        });
    }
    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: format!("Email {} deleted from '{}'", uid, query.folder_name),
        deleted,
    }))
}

#[delete("/delete-multiple")]
async fn delete_emails(
    state: Data<AppState>,
    payload: Json<DeleteRequest>,
) -> Result<HttpResponse, ApiError> {
    info!("Handling DELETE /api/email/delete-multiple");
    let request = validate_payload(payload.into_inner())?;

    let deleted = state
        .email_service
        .delete(&request.folder_name, &request.uids)
        .await?;
    Ok(HttpResponse::Ok().json(DeleteResponse {
        message: format!(
            "Deleted {} of {} email(s) from '{}'",
            deleted,
            request.uids.len(),
            request.folder_name
        ),
        deleted,
    }))
}

// --- Server Setup ---

fn build_cors(rest: &RestConfig) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
        .max_age(3600);

    if rest.allowed_origins.iter().any(|o| o == "*") {
        cors = cors.allow_any_origin();
    } else {
        for origin in &rest.allowed_origins {
            cors = cors.allowed_origin(origin);
        }
    }
    cors
}

pub async fn run_server(state: AppState) -> std::io::Result<()> {
    let rest_config = state.settings.rest.clone();
    let bind_address = format!("{}:{}", rest_config.host, rest_config.port);
    info!("Starting REST API server at {}", bind_address);

    let app_state = Data::new(state);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(build_cors(&rest_config))
            .app_data(app_state.clone())
            .configure(configure_rest_service)
    })
    .bind(bind_address)?
    .run()
    .await
}
