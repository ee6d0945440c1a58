//! HTTP glue: the share URL as a QR image.

use hyper::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue};
use hyper::{Body, Response, StatusCode};
use tracing::error;

use crate::sys_core::core::AppContext;
use crate::sys_core::handlers::respond_status;
use crate::sys_share::core::{encode_qr_png, resolve_lan_address, share_url};

pub async fn handler_qr(ctx: &AppContext) -> Response<Body> {
    let url = share_url(resolve_lan_address(), ctx.config.port);
    match encode_qr_png(&url) {
        Ok(png) => {
            let mut resp = Response::new(Body::from(png));
            resp.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
            // the LAN address can change between requests
            resp.headers_mut()
                .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
            resp
        }
        Err(e) => {
            error!("qr for {url} failed: {e}");
            respond_status(StatusCode::INTERNAL_SERVER_ERROR, "qr error")
        }
    }
}
