//! HTTP glue: turn store results into hyper::Response<Body>.

use std::fmt::Display;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::Stream;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue, IF_MODIFIED_SINCE, LAST_MODIFIED};
use hyper::{Body, Request, Response, StatusCode};
use multer::{Constraints, Field, Multipart, SizeLimit};
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::sys_core::core::AppContext;
use crate::sys_core::handlers::{query_param, redirect_with_message, respond_status};
use crate::sys_fileapi::core::{FileStore, StoreError};
use crate::sys_fileapi::names;

const FILE_FIELD: &str = "file";
// attempts per upload before giving up on a free name
const MAX_NAME_ATTEMPTS: u32 = 100;

const MSG_UPLOAD_FAILED: &str = "Ошибка загрузки";
const MSG_SAVE_FAILED: &str = "Ошибка сохранения";
const MSG_COPY_FAILED: &str = "Ошибка копирования";
const MSG_DELETED: &str = "Удалено";

pub async fn handler_upload(req: Request<Body>, ctx: &AppContext) -> Response<Body> {
    // parse boundary
    let boundary = match req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .map(multer::parse_boundary)
    {
        Some(Ok(b)) => b,
        Some(Err(e)) => {
            warn!("upload rejected, bad boundary: {e}");
            return redirect_with_message(MSG_UPLOAD_FAILED);
        }
        None => {
            warn!("upload rejected, missing Content-Type");
            return redirect_with_message(MSG_UPLOAD_FAILED);
        }
    };

    let constraints = upload_constraints(ctx.config.max_upload_bytes);
    let mut multipart = Multipart::with_constraints(req.into_body(), boundary, constraints);

    let field = match next_file_field(&mut multipart).await {
        Ok(Some(f)) => f,
        Ok(None) => {
            warn!("upload rejected, no `{FILE_FIELD}` part with a filename");
            return redirect_with_message(MSG_UPLOAD_FAILED);
        }
        Err(e) => {
            warn!("multipart error: {e}");
            return redirect_with_message(MSG_UPLOAD_FAILED);
        }
    };

    let client_name = field.file_name().unwrap_or_default().to_string();
    let Some(base) = names::upload_name(&client_name) else {
        warn!("upload rejected, unusable filename {client_name:?}");
        return redirect_with_message(MSG_UPLOAD_FAILED);
    };

    let mut body = Box::pin(field);
    match store_upload(&ctx.store, &base, &mut body).await {
        Ok((stored, bytes)) => {
            info!("upload {client_name:?} stored as {stored} ({bytes} bytes)");
            redirect_with_message(&format!("Загружено: {stored}"))
        }
        Err(e) => {
            warn!("upload {client_name:?} failed: {e}");
            redirect_with_message(upload_failure_message(&e))
        }
    }
}

fn upload_constraints(limit: u64) -> Constraints {
    Constraints::new().size_limit(SizeLimit::new().whole_stream(limit))
}

/// Skip parts until the `file` part that carries a filename.
async fn next_file_field<'r>(
    multipart: &mut Multipart<'r>,
) -> Result<Option<Field<'r>>, multer::Error> {
    while let Some(field) = multipart.next_field().await? {
        let is_file = field.name() == Some(FILE_FIELD)
            && field.file_name().is_some_and(|n| !n.is_empty());
        if is_file {
            return Ok(Some(field));
        }
    }
    Ok(None)
}

/// Save under `<stem>_<unix secs><ext>`, adding `-N` when that name is taken.
async fn store_upload<S, E>(
    store: &FileStore,
    base: &str,
    body: &mut S,
) -> Result<(String, u64), StoreError>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: Display,
{
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = names::disambiguate_attempt(base, secs, attempt);
        match store.save(&name, &mut *body).await {
            Ok(bytes) => return Ok((name, bytes)),
            Err(StoreError::AlreadyExists) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(StoreError::AlreadyExists)
}

fn upload_failure_message(e: &StoreError) -> &'static str {
    match e {
        StoreError::Stream(_) => MSG_UPLOAD_FAILED,
        StoreError::Write(_) => MSG_COPY_FAILED,
        StoreError::InvalidName
        | StoreError::NotFound
        | StoreError::AlreadyExists
        | StoreError::Io(_) => MSG_SAVE_FAILED,
    }
}

/// Best-effort delete; always reports success.
pub async fn handler_delete(req: &Request<Body>, ctx: &AppContext) -> Response<Body> {
    let target = query_param(req.uri().query(), "name").and_then(|n| names::base_name(&n));
    if let Some(name) = target {
        ctx.store.remove(&name).await;
    }
    redirect_with_message(MSG_DELETED)
}

/// Stream one stored file back with its guessed content type.
pub async fn handler_download(raw: &str, req: &Request<Body>, ctx: &AppContext) -> Response<Body> {
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    let Some(name) = names::base_name(&decoded) else {
        return respond_status(StatusCode::NOT_FOUND, "Not found");
    };

    let (file, meta) = match ctx.store.open(&name).await {
        Ok(opened) => opened,
        Err(StoreError::NotFound | StoreError::InvalidName) => {
            return respond_status(StatusCode::NOT_FOUND, "Not found");
        }
        Err(e) => {
            warn!("cannot open {name}: {e}");
            return respond_status(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };

    let modified: Option<DateTime<Utc>> = meta.modified().ok().map(DateTime::from);
    if let (Some(modified), Some(since)) = (modified, if_modified_since(req)) {
        if modified.timestamp() <= since.timestamp() {
            let mut r = Response::new(Body::empty());
            *r.status_mut() = StatusCode::NOT_MODIFIED;
            return r;
        }
    }

    let mime = mime_guess::from_path(&name).first_or_octet_stream();
    let mut resp = Response::new(Body::wrap_stream(ReaderStream::new(file)));
    let headers = resp.headers_mut();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_str(mime.as_ref())
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(meta.len()));
    if let Some(value) = modified.and_then(|m| HeaderValue::from_str(&http_date(m)).ok()) {
        headers.insert(LAST_MODIFIED, value);
    }
    resp
}

fn http_date(t: DateTime<Utc>) -> String {
    t.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn if_modified_since(req: &Request<Body>) -> Option<DateTime<Utc>> {
    let raw = req.headers().get(IF_MODIFIED_SINCE)?.to_str().ok()?;
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
