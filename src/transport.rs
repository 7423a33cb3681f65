//! The two ways the router is exposed: a TCP listener and the Lambda runtime
//!
//! Both feed requests into the same [`Router`], so responses match by construction.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
    body::Body,
    extract::Request,
    http::{uri::PathAndQuery, Uri},
    response::Response,
    Router,
};
use lambda_http::{request::RequestContext, service_fn, RequestExt};
use tokio::net::TcpListener;
use tower::ServiceExt;
use tracing::info;

pub async fn serve_listener(app: Router, bind_socket: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_socket).await?;
    serve_on(listener, app).await
}

pub async fn serve_on(listener: TcpListener, app: Router) -> std::io::Result<()> {
    info!(local_addr = %listener.local_addr()?, "listener transport starting");
    axum::serve(listener, app.into_make_service()).await
}

pub async fn serve_function(app: Router) -> Result<(), lambda_http::Error> {
    info!("function transport starting");
    lambda_http::run(service_fn(move |event| dispatch_event(app.clone(), event))).await
}

/// Translates one function invocation into a router call.
pub async fn dispatch_event(
    app: Router,
    event: lambda_http::Request,
) -> Result<Response, Infallible> {
    let stage = match event.request_context_ref() {
        Some(RequestContext::ApiGatewayV1(context)) => context.stage.clone(),
        _ => None,
    };

    let (mut parts, body) = event.into_parts();
    if let Some(uri) = stage.and_then(|stage| strip_stage(&parts.uri, &stage)) {
        parts.uri = uri;
    }
    let request = Request::from_parts(parts, Body::new(body));
    app.oneshot(request).await
}

/// REST API events arrive with `/{stage}` in front of the resource path; routes never carry it.
fn strip_stage(uri: &Uri, stage: &str) -> Option<Uri> {
    let prefix = format!("/{stage}");
    let rest = uri.path().strip_prefix(&prefix)?;
    if !rest.is_empty() && !rest.starts_with('/') {
        return None;
    }

    let path = if rest.is_empty() { "/" } else { rest };
    let path_and_query = match uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };

    let mut uri_parts = uri.clone().into_parts();
    uri_parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(uri_parts).ok()
}
