//! Upload pipeline to the recognition service.
//!
//! Both endpoints take a single-part multipart body with the JPEG under
//! the `file` field. Transport errors never escape: every failure mode
//! collapses into a [`VerificationOutcome`] for the status model.

use crate::outcome::{interpret_match, interpret_stream, VerificationOutcome};
use reqwest::multipart::{Form, Part};
use std::time::Duration;
use thiserror::Error;

/// Field name the service expects the image under.
pub const FILE_FIELD: &str = "file";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("http client construction failed: {0}")]
    Client(#[from] reqwest::Error),
}

/// Clone-safe client for the match and stream endpoints.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    match_url: String,
    stream_url: String,
}

impl ApiClient {
    pub fn new(match_url: impl Into<String>, stream_url: impl Into<String>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            match_url: match_url.into(),
            stream_url: stream_url.into(),
        })
    }

    /// Upload one frame to the match endpoint (single-shot verify).
    pub async fn submit_match(&self, jpeg: Vec<u8>) -> VerificationOutcome {
        self.submit(self.match_url.clone(), jpeg, "verify.jpg", interpret_match)
            .await
    }

    /// Upload one frame to the stream endpoint (live tick).
    pub async fn submit_stream(&self, jpeg: Vec<u8>) -> VerificationOutcome {
        self.submit(self.stream_url.clone(), jpeg, "frame.jpg", interpret_stream)
            .await
    }

    async fn submit(
        &self,
        url: String,
        jpeg: Vec<u8>,
        filename: &'static str,
        interpret: fn(u16, &[u8]) -> VerificationOutcome,
    ) -> VerificationOutcome {
        let bytes = jpeg.len();
        let part = match Part::bytes(jpeg).file_name(filename).mime_str("image/jpeg") {
            Ok(part) => part,
            Err(e) => return VerificationOutcome::failure(e.to_string()),
        };
        let form = Form::new().part(FILE_FIELD, part);

        let response = match self.http.post(&url).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "upload failed");
                return VerificationOutcome::failure(e.to_string());
            }
        };

        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return VerificationOutcome::failure(e.to_string()),
        };

        tracing::debug!(url = %url, status, bytes, "upload completed");
        interpret(status, &body)
    }
}
