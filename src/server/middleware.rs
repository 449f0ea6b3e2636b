// HTTP middleware
// Author: kelexine (https://github.com/kelexine)

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};

/// Response header carrying the exchange ID that keys the audit files.
pub const EXCHANGE_ID_HEADER: &str = "x-exchange-id";

/// Request IDs of the form `req_<uuid>`, kept distinct from exchange IDs
/// since clients may supply their own `x-request-id`.
#[derive(Clone, Copy, Default)]
pub struct MakeGatewayRequestId;

impl MakeRequestId for MakeGatewayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = format!("req_{}", uuid::Uuid::new_v4().simple());
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Create request ID layers for the application
pub fn request_id_layers() -> (SetRequestIdLayer<MakeGatewayRequestId>, PropagateRequestIdLayer) {
    (
        SetRequestIdLayer::x_request_id(MakeGatewayRequestId),
        PropagateRequestIdLayer::x_request_id(),
    )
}

/// The request ID set (or passed through) by [`request_id_layers`].
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(HeaderName::from_static("x-request-id"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}
