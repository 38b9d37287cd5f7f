// SPDX-License-Identifier: MIT OR Apache-2.0
//! HTTP routes of the encoding service.

use actix_web::http::header::ContentType;
use actix_web::middleware::DefaultHeaders;
use actix_web::{web, HttpRequest, HttpResponse};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Result, ServiceError};
use crate::ffmpeg::{self, OUTPUT_FILE};
use crate::sessions::{is_safe_component, schedule_cleanup, FrameSlot, SessionRegistry};
use crate::settings::EncoderSettings;

/// Shared service state
#[derive(Debug)]
pub struct AppState {
    /// In-flight sessions
    pub registry: Arc<SessionRegistry>,
    /// Service configuration
    pub settings: EncoderSettings,
}

impl AppState {
    /// Create state for the given settings
    pub fn new(settings: EncoderSettings) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(settings.output_dir.clone())),
            settings,
        }
    }
}

/// Cross-origin isolation headers added to every response
pub fn isolation_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Cross-Origin-Opener-Policy", "same-origin"))
        .add(("Cross-Origin-Embedder-Policy", "require-corp"))
}

/// Register the service routes
pub fn configure(state: web::Data<AppState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        let limit = state.settings.max_frame_bytes;
        cfg.app_data(state)
            .app_data(web::PayloadConfig::new(limit))
            .route("/start", web::post().to(start))
            .route("/frame", web::post().to(frame))
            .route("/finish", web::post().to(finish))
            .route("/output/{token}/{file}", web::get().to(output));
    }
}

fn header<T: FromStr>(req: &HttpRequest, name: &'static str) -> Result<T> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .ok_or(ServiceError::BadHeader(name))
}

async fn start(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let token: String = header(&req, "token")?;
    let frames: u32 = header(&req, "frames")?;

    let generation = state.registry.start(&token, frames).await?;
    schedule_cleanup(
        Arc::clone(&state.registry),
        token,
        generation,
        state.settings.cleanup_after(),
    );
    Ok(HttpResponse::Ok().finish())
}

async fn frame(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let token: String = header(&req, "token")?;
    let index: u32 = header(&req, "index")?;

    if let FrameSlot::Write(path) = state.registry.claim_frame(&token, index)? {
        if let Err(e) = tokio::fs::write(&path, &body).await {
            state.registry.release_frame(&token, index);
            return Err(e.into());
        }
        state.registry.frame_written(&token, index);
    }
    Ok(HttpResponse::Ok().finish())
}

async fn finish(req: HttpRequest, state: web::Data<AppState>) -> Result<HttpResponse> {
    let token: String = header(&req, "token")?;

    let completed = state
        .registry
        .wait_complete(&token, state.settings.finish_timeout())
        .await?;
    let encoded =
        ffmpeg::encode(&state.settings.ffmpeg, state.settings.framerate, &completed.dir).await;
    // The idle period for downloading starts once encoding is over
    state.registry.touch(&token, completed.generation);
    encoded?;
    tracing::info!(token, "Export encoded");

    let host = req.connection_info().host().to_string();
    Ok(HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(format!("http://{host}/output/{token}/{OUTPUT_FILE}")))
}

fn content_type(file: &str) -> &'static str {
    match file.rsplit_once('.').map(|(_, ext)| ext) {
        Some("mp4") => "video/mp4",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}

async fn output(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let (token, file) = path.into_inner();
    if !is_safe_component(&token) || !is_safe_component(&file) {
        return Err(ServiceError::InvalidPath);
    }

    let path = state.registry.root().join(&token).join(&file);
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ServiceError::NotFound),
        Err(e) => return Err(e.into()),
    };
    Ok(HttpResponse::Ok()
        .content_type(content_type(&file))
        .body(bytes))
}
