use std::path::Path;
use std::sync::Arc;
use tauri::http::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE};
use tauri::http::{Request, Response, StatusCode};
use tauri::{AppHandle, Builder, Manager, Runtime, UriSchemeContext, UriSchemeResponder};
use tracing::{error, info, warn};

use super::{VirtualRequest, VirtualResourceResolver, VirtualScheme};

/// Proof that the resolver is managed and the schemes can serve requests.
/// Only [`activate`] hands one out; the main window needs it to be built.
#[derive(Debug, Clone, Copy)]
pub struct ResolverReady {
    _sealed: (),
}

/// Register the three virtual schemes on the builder.
/// Must run before any webview exists; the handlers answer 503 until [`activate`].
pub fn register_schemes<R: Runtime>(builder: Builder<R>) -> Builder<R> {
    VirtualScheme::ALL
        .into_iter()
        .fold(builder, |builder, scheme| {
            builder.register_asynchronous_uri_scheme_protocol(scheme.as_str(), handle_request::<R>)
        })
}

/// Hand the resolver to the running app. Returns the ready signal the main
/// window is created with.
pub fn activate<R: Runtime>(
    app: &AppHandle<R>,
    resolver: Arc<VirtualResourceResolver>,
) -> ResolverReady {
    for scheme in VirtualScheme::ALL {
        info!("Serving {}:// from {:?}", scheme.as_str(), resolver.root(scheme));
    }
    if !app.manage(resolver) {
        warn!("Resolver already managed, keeping the existing one");
    }

    let ready = ResolverReady { _sealed: () };
    app.manage(ready);
    ready
}

fn handle_request<R: Runtime>(
    ctx: UriSchemeContext<'_, R>,
    request: Request<Vec<u8>>,
    responder: UriSchemeResponder,
) {
    let uri = request.uri().to_string();
    let Some(resolver) = ctx
        .app_handle()
        .try_state::<Arc<VirtualResourceResolver>>()
        .map(|state| state.inner().clone())
    else {
        error!("Resource request before resolver activation: {}", uri);
        responder.respond(text_response(StatusCode::SERVICE_UNAVAILABLE, "resolver not ready"));
        return;
    };

    // File access stays off the webview thread
    tauri::async_runtime::spawn_blocking(move || {
        responder.respond(serve(&resolver, &uri));
    });
}

/// Resolve a request URL and build the webview response
pub(crate) fn serve(resolver: &VirtualResourceResolver, uri: &str) -> Response<Vec<u8>> {
    let Some(request) = VirtualRequest::from_url(uri) else {
        warn!("Rejected malformed resource request: {}", uri);
        return text_response(StatusCode::BAD_REQUEST, "malformed resource request");
    };

    let path = match resolver.resolve_request(&request) {
        Ok(path) => path,
        Err(e) => {
            let status = StatusCode::from_u16(e.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return text_response(status, &e.to_string());
        }
    };

    match std::fs::read(&path) {
        Ok(bytes) => file_response(&path, bytes),
        Err(e) => {
            error!("Failed to read {:?}: {}", path, e);
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to read resource")
        }
    }
}

fn file_response(path: &Path, bytes: Vec<u8>) -> Response<Vec<u8>> {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, mime.essence_str())
        // Fonts are fetched cross-scheme from app:// pages
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(bytes)
        .unwrap_or_else(|e| {
            error!("Failed to build response for {:?}: {}", path, e);
            empty_response(StatusCode::INTERNAL_SERVER_ERROR)
        })
}

fn text_response(status: StatusCode, message: &str) -> Response<Vec<u8>> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(ACCESS_CONTROL_ALLOW_ORIGIN, "*")
        .body(message.as_bytes().to_vec())
        .unwrap_or_else(|_| empty_response(status))
}

fn empty_response(status: StatusCode) -> Response<Vec<u8>> {
    let mut response = Response::new(Vec::new());
    *response.status_mut() = status;
    response
}
