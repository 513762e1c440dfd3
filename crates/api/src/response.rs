//! The `{ "data": ... }` envelope used by the account endpoints.
//!
//! Processing endpoints (`/remove-watermark`, `/task`, `/callback`) answer
//! with flat bodies instead, because the browser client reads their fields
//! at the top level.

use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for DataResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
