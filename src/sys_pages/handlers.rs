//! HTTP glue for the two HTML pages.

use hyper::{Body, Request, Response};

use crate::sys_core::core::AppContext;
use crate::sys_core::handlers::{html_response, query_param};
use crate::sys_pages::core::{gallery_images, uploaded_files};
use crate::sys_share::core::{resolve_lan_address, share_url};

pub async fn handler_index(req: &Request<Body>, ctx: &AppContext) -> Response<Body> {
    let message = query_param(req.uri().query(), "msg");
    let entries = ctx.store.list().await;
    let files = uploaded_files(&entries);
    let url = share_url(resolve_lan_address(), ctx.config.port);
    html_response(ctx.pages.render_index(message.as_deref(), &files, &url))
}

pub async fn handler_gallery(ctx: &AppContext) -> Response<Body> {
    let entries = ctx.store.list().await;
    html_response(ctx.pages.render_gallery(&gallery_images(&entries)))
}
