//! Request routing plus the small response builders every handler shares.

use std::convert::Infallible;
use std::sync::Arc;

use hyper::header::{ALLOW, CONTENT_TYPE, HeaderValue, LOCATION};
use hyper::{Body, Method, Request, Response, StatusCode};
use tracing::debug;

use crate::sys_core::core::AppContext;
use crate::sys_fileapi::handlers as fileapi;
use crate::sys_pages::handlers as pages;
use crate::sys_share::handlers as share;

enum Route<'a> {
    Index,
    Upload,
    Delete,
    Gallery,
    Qr,
    File(&'a str),
    Unknown,
}

fn resolve_route(path: &str) -> Route<'_> {
    match path {
        "/" => Route::Index,
        "/upload" => Route::Upload,
        "/delete" => Route::Delete,
        "/gallery" => Route::Gallery,
        "/qr.png" => Route::Qr,
        _ => match path.strip_prefix("/f/") {
            Some(name) => Route::File(name),
            None => Route::Unknown,
        },
    }
}

/// Entry point for every request.
pub async fn route(req: Request<Body>, ctx: Arc<AppContext>) -> Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    debug!("{} {}", method, path);

    let is_read = method == Method::GET || method == Method::HEAD;
    let mut resp = match resolve_route(&path) {
        Route::Upload if method == Method::POST => fileapi::handler_upload(req, &ctx).await,
        Route::Delete if method == Method::POST => fileapi::handler_delete(&req, &ctx).await,
        Route::Upload | Route::Delete => method_not_allowed("POST"),
        Route::Unknown => respond_status(StatusCode::NOT_FOUND, "Not found"),
        _ if !is_read => method_not_allowed("GET, HEAD"),
        Route::Index => pages::handler_index(&req, &ctx).await,
        Route::Gallery => pages::handler_gallery(&ctx).await,
        Route::Qr => share::handler_qr(&ctx).await,
        Route::File(name) => fileapi::handler_download(name, &req, &ctx).await,
    };

    if method == Method::HEAD {
        *resp.body_mut() = Body::empty();
    }
    Ok(resp)
}

// ---------------------- Response helpers ----------------------

pub fn respond_status(code: StatusCode, msg: &str) -> Response<Body> {
    let mut r = Response::new(Body::from(msg.to_string()));
    *r.status_mut() = code;
    r.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    r
}

pub fn method_not_allowed(allow: &'static str) -> Response<Body> {
    let mut r = respond_status(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    r.headers_mut().insert(ALLOW, HeaderValue::from_static(allow));
    r
}

pub fn html_response(html: String) -> Response<Body> {
    let mut resp = Response::new(Body::from(html));
    resp.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    resp
}

/// 303 back to the index page with a status message in `?msg=`.
pub fn redirect_with_message(msg: &str) -> Response<Body> {
    let location = format!("/?msg={}", urlencoding::encode(msg));
    let mut r = Response::new(Body::empty());
    *r.status_mut() = StatusCode::SEE_OTHER;
    r.headers_mut().insert(
        LOCATION,
        HeaderValue::from_str(&location).unwrap_or_else(|_| HeaderValue::from_static("/")),
    );
    r
}

/// Look up a form-encoded query parameter (`+` means space).
pub fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    query?.split('&').find_map(|pair| {
        let mut it = pair.splitn(2, '=');
        let k = decode_component(it.next()?);
        if k != key {
            return None;
        }
        Some(decode_component(it.next().unwrap_or_default()))
    })
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(s) => s.into_owned(),
        Err(_) => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys_config::core::Config;
    use hyper::body::to_bytes;
    use hyper::header::{CONTENT_LENGTH, IF_MODIFIED_SINCE, LAST_MODIFIED};
    use std::path::Path;
    use tempfile::TempDir;

    const BOUNDARY: &str = "dropgo-test-boundary";

    fn test_ctx(dir: &Path) -> Arc<AppContext> {
        Arc::new(AppContext::new(Config {
            upload_dir: dir.to_path_buf(),
            ..Config::default()
        }))
    }

    fn request(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn multipart_body(field: &str, filename: &str, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n\
                 --{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(multipart_body("file", filename, content)))
            .unwrap()
    }

    async fn send(ctx: &Arc<AppContext>, req: Request<Body>) -> Response<Body> {
        route(req, ctx.clone()).await.unwrap()
    }

    async fn body_bytes(resp: Response<Body>) -> Vec<u8> {
        to_bytes(resp.into_body()).await.unwrap().to_vec()
    }

    async fn body_text(resp: Response<Body>) -> String {
        String::from_utf8(body_bytes(resp).await).unwrap()
    }

    /// Status message carried by a redirect's `Location`.
    fn redirect_message(resp: &Response<Body>) -> String {
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        let location = resp.headers()[LOCATION].to_str().unwrap();
        let query = location.strip_prefix("/?").unwrap();
        query_param(Some(query), "msg").unwrap()
    }

    fn stored_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn query_param_decodes_values() {
        let q = Some("a=1&msg=%D0%A3%D0%B4%D0%B0%D0%BB%D0%B5%D0%BD%D0%BE&b=x+y%2Bz");
        assert_eq!(query_param(q, "msg").as_deref(), Some("Удалено"));
        assert_eq!(query_param(q, "b").as_deref(), Some("x y+z"));
        assert_eq!(query_param(q, "missing"), None);
        assert_eq!(query_param(None, "msg"), None);
        assert_eq!(query_param(Some("flag"), "flag").as_deref(), Some(""));
    }

    #[tokio::test]
    async fn upload_list_and_serve_round_trip() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(tmp.path());
        let content: Vec<u8> = (0..5000u32).map(|i| (i % 251) as u8).collect();

        let resp = send(&ctx, upload_request("photo.jpg", &content)).await;
        let msg = redirect_message(&resp);

        let names = stored_names(tmp.path());
        assert_eq!(names.len(), 1);
        let stored = &names[0];
        assert!(stored.starts_with("photo_") && stored.ends_with(".jpg"), "{stored}");
        assert_eq!(msg, format!("Загружено: {stored}"));

        let index = body_text(send(&ctx, request(Method::GET, "/")).await).await;
        assert!(index.contains(stored.as_str()));
        assert!(index.contains("(4 KB, "));
        assert!(index.contains("Файлы (1)"));

        let resp = send(&ctx, request(Method::GET, &format!("/f/{stored}"))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "image/jpeg");
        assert_eq!(resp.headers()[CONTENT_LENGTH], "5000");
        assert_eq!(body_bytes(resp).await, content);
    }

    #[tokio::test]
    async fn same_name_uploads_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(tmp.path());

        send(&ctx, upload_request("photo.jpg", b"first")).await;
        send(&ctx, upload_request("photo.jpg", b"second")).await;

        let names = stored_names(tmp.path());
        assert_eq!(names.len(), 2);
        assert_ne!(names[0], names[1]);

        let mut bodies = Vec::new();
        for name in &names {
            let resp = send(&ctx, request(Method::GET, &format!("/f/{name}"))).await;
            assert_eq!(resp.status(), StatusCode::OK);
            bodies.push(body_text(resp).await);
        }
        bodies.sort();
        assert_eq!(bodies, ["first", "second"]);
    }

    #[tokio::test]
    async fn upload_over_size_limit_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let ctx = Arc::new(AppContext::new(Config {
            upload_dir: tmp.path().to_path_buf(),
            max_upload_bytes: 1024,
            ..Config::default()
        }));

        let resp = send(&ctx, upload_request("big.bin", &[7u8; 4096])).await;
        assert_eq!(redirect_message(&resp), "Ошибка загрузки");
        assert!(stored_names(tmp.path()).is_empty());

        let resp = send(&ctx, upload_request("small.bin", &[7u8; 100])).await;
        assert!(redirect_message(&resp).starts_with("Загружено: small_"));
        assert_eq!(stored_names(tmp.path()).len(), 1);
    }

    #[tokio::test]
    async fn upload_strips_client_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("uploads");
        std::fs::create_dir(&root).unwrap();
        let ctx = test_ctx(&root);

        let resp = send(&ctx, upload_request("../../etc/passwd", b"nope")).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);

        let names = stored_names(&root);
        assert_eq!(names.len(), 1);
        assert!(names[0].starts_with("passwd_"));
        assert_eq!(stored_names(tmp.path()), ["uploads"]);
    }

    #[tokio::test]
    async fn upload_without_file_field_redirects_with_error() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(tmp.path());

        let req = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(multipart_body("other", "x.txt", b"data")))
            .unwrap();
        let resp = send(&ctx, req).await;
        assert_eq!(redirect_message(&resp), "Ошибка загрузки");

        let req = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .body(Body::from("not multipart"))
            .unwrap();
        let resp = send(&ctx, req).await;
        assert_eq!(redirect_message(&resp), "Ошибка загрузки");
        assert!(stored_names(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn post_only_routes_reject_other_methods() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(tmp.path());

        for uri in ["/upload", "/delete?name=x"] {
            let resp = send(&ctx, request(Method::GET, uri)).await;
            assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(resp.headers()[ALLOW], "POST");
        }
        let resp = send(&ctx, request(Method::POST, "/gallery")).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn delete_removes_file_and_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("old note.txt"), b"bye").unwrap();
        let ctx = test_ctx(tmp.path());

        let resp = send(&ctx, request(Method::POST, "/delete?name=old%20note.txt")).await;
        assert_eq!(redirect_message(&resp), "Удалено");
        assert!(stored_names(tmp.path()).is_empty());

        let index = body_text(send(&ctx, request(Method::GET, "/")).await).await;
        assert!(!index.contains("old note.txt"));
        let resp = send(&ctx, request(Method::GET, "/f/old%20note.txt")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&ctx, request(Method::POST, "/delete?name=never-existed.bin")).await;
        assert_eq!(redirect_message(&resp), "Удалено");
        let resp = send(&ctx, request(Method::POST, "/delete")).await;
        assert_eq!(redirect_message(&resp), "Удалено");
    }

    #[tokio::test]
    async fn delete_cannot_escape_upload_dir() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("uploads");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(tmp.path().join("keep.txt"), b"outside").unwrap();
        let ctx = test_ctx(&root);

        send(&ctx, request(Method::POST, "/delete?name=..%2Fkeep.txt")).await;
        assert!(tmp.path().join("keep.txt").exists());
    }

    #[tokio::test]
    async fn download_is_confined_and_404s() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("uploads");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(tmp.path().join("secret.txt"), b"outside").unwrap();
        std::fs::write(root.join("secret.txt"), b"inside").unwrap();
        let ctx = test_ctx(&root);

        let resp = send(&ctx, request(Method::GET, "/f/..%2Fsecret.txt")).await;
        assert_eq!(body_text(resp).await, "inside");

        for uri in ["/f/missing.png", "/f/sub", "/f/..", "/f/"] {
            let resp = send(&ctx, request(Method::GET, uri)).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn backslash_names_are_served_and_deleted() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a\\b.txt"), b"odd name").unwrap();
        let ctx = test_ctx(tmp.path());

        let index = body_text(send(&ctx, request(Method::GET, "/")).await).await;
        assert!(index.contains(r#"href="/f/a%5Cb.txt""#));

        let resp = send(&ctx, request(Method::GET, "/f/a%5Cb.txt")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "odd name");

        send(&ctx, request(Method::POST, "/delete?name=a%5Cb.txt")).await;
        assert!(stored_names(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn download_honours_head_and_if_modified_since() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("doc.pdf"), b"%PDF-1.4").unwrap();
        let ctx = test_ctx(tmp.path());

        let resp = send(&ctx, request(Method::HEAD, "/f/doc.pdf")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "application/pdf");
        assert_eq!(resp.headers()[CONTENT_LENGTH], "8");
        let last_modified = resp.headers()[LAST_MODIFIED].clone();
        assert!(body_bytes(resp).await.is_empty());

        let req = Request::builder()
            .uri("/f/doc.pdf")
            .header(IF_MODIFIED_SINCE, last_modified)
            .body(Body::empty())
            .unwrap();
        let resp = send(&ctx, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_MODIFIED);
    }

    #[tokio::test]
    async fn gallery_lists_only_images() {
        let tmp = TempDir::new().unwrap();
        for name in ["a.JPG", "b.jpeg", "c.png", "d.gif", "e.webp", "f.txt", "g.mp4", "h.heic"] {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(tmp.path().join("i.png")).unwrap();
        let ctx = test_ctx(tmp.path());

        let resp = send(&ctx, request(Method::GET, "/gallery")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
        let html = body_text(resp).await;
        for name in ["a.JPG", "b.jpeg", "c.png", "d.gif", "e.webp"] {
            assert!(html.contains(&format!(r#"src="/f/{name}""#)), "{name}");
        }
        for name in ["f.txt", "g.mp4", "h.heic", "i.png"] {
            assert!(!html.contains(name), "{name}");
        }
    }

    #[tokio::test]
    async fn index_echoes_escaped_message() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(tmp.path());

        let resp = send(&ctx, request(Method::GET, "/?msg=%3Cb%3Ehi%3C%2Fb%3E")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_text(resp).await;
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(html.contains("Пока пусто"));
        assert!(html.contains(r#"src="/qr.png""#));
    }

    #[tokio::test]
    async fn index_survives_missing_upload_dir() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(&tmp.path().join("gone"));

        let resp = send(&ctx, request(Method::GET, "/")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_text(resp).await.contains("Файлы (0)"));
    }

    #[tokio::test]
    async fn qr_endpoint_returns_png() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(tmp.path());

        let resp = send(&ctx, request(Method::GET, "/qr.png")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], "image/png");
        let png = body_bytes(resp).await;
        assert!(png.starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn unknown_paths_are_404() {
        let tmp = TempDir::new().unwrap();
        let ctx = test_ctx(tmp.path());

        let resp = send(&ctx, request(Method::GET, "/favicon.ico")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
