//! Fill `error.path` of AppError responses with the request path.
//!
//! AppError::into_response does not know the URI; it leaves its ErrorBody in the
//! response extensions and this layer re-renders the JSON body with the path set.
//! Apply at the top-level Router so the path is the full (un-nested) one.

use axum::{
    Router,
    body::Body,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::{ErrorBody, ErrorResponse};

pub fn apply(router: Router) -> Router {
    router.layer(middleware::from_fn(error_path_middleware))
}

async fn error_path_middleware(req: Request<Body>, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let mut res = next.run(req).await;

    let Some(mut error) = res.extensions_mut().remove::<ErrorBody>() else {
        return res;
    };
    error.path = Some(path);

    let (mut parts, original) = res.into_parts();
    match serde_json::to_vec(&ErrorResponse { error }) {
        Ok(bytes) => {
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to re-render error body");
            Response::from_parts(parts, original)
        }
    }
}
