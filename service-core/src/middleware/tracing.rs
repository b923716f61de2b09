//! Request-id plumbing. Every request gets an id, caller-supplied or
//! freshly minted, stamped on both the request and the response so log
//! lines and client reports can be correlated.

use axum::http::{HeaderName, HeaderValue};
use axum::{extract::Request, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let header = HeaderName::from_static(REQUEST_ID_HEADER);

    let request_id = match req.headers().get(&header) {
        Some(value) => value.clone(),
        None => minted_id(),
    };

    req.headers_mut().insert(header.clone(), request_id.clone());

    let mut response = next.run(req).await;
    response.headers_mut().insert(header, request_id);
    response
}

fn minted_id() -> HeaderValue {
    // A hyphenated uuid is always a valid header value.
    HeaderValue::from_str(&Uuid::new_v4().to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("-"))
}
