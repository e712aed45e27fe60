// Warp error handling and propagation
// Courtesy of https://github.com/seanmonstar/warp/pull/909#issuecomment-1184854848
//
// Handlers return `Result<impl Reply, ApiError>` instead of a rejection: rejections mean
// "another filter may handle this", whereas our errors are final. `ApiError` knows its own
// status code and JSON body, and `into_response` collapses the `Result` into a response:
//
//   .then(my_handler_func)
//   .map(into_response)
//

use serde_json::json;
use warp::hyper::{Body, Response, StatusCode};
use warp::Reply;

use crate::upstream::FetchError;

/// Shown for both fetch failures and schemas without tables
pub const INVALID_SCHEMA_SOURCE: &str =
    "The URL does not point to a valid DBML schema source";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("A schema source URL is required")]
    MissingInput,

    #[error("Schema source unavailable: {0}")]
    UpstreamUnavailable(#[from] FetchError),

    #[error("Schema source returned an empty schema or one without tables")]
    EmptyOrInvalidSchema,

    #[error("{0}")]
    InternalFailure(String),
}

impl ApiError {
    fn status_code_body(self) -> (StatusCode, String) {
        match self {
            ApiError::MissingInput => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::UpstreamUnavailable(_) | ApiError::EmptyOrInvalidSchema => {
                (StatusCode::BAD_REQUEST, INVALID_SCHEMA_SOURCE.to_string())
            }
            ApiError::InternalFailure(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        }
    }
}

impl Reply for ApiError {
    fn into_response(self) -> Response<Body> {
        let (status, message) = self.status_code_body();
        warp::reply::with_status(warp::reply::json(&json!({ "error": message })), status)
            .into_response()
    }
}

pub fn into_response<S: Reply, E: Reply>(reply_res: Result<S, E>) -> Response<Body> {
    match reply_res {
        Ok(resp) => resp.into_response(),
        Err(err) => err.into_response(),
    }
}
