//! A shared `reqwest` client with retries and exponential backoff.
//!
//! Connection failures, timeouts, truncated bodies, `429` and `5xx` answers are retried up to
//! [`MAX_RETRIES`] times, waiting 1 s, 2 s, 4 s. Every other answer, including `404`, is handed
//! back to the caller to interpret.

use crate::{Blob, ByteRange};
use anyhow::{Result, bail};
use reqwest::{Client, StatusCode, Url, header};
use std::time::Duration;
use tokio::time::sleep;

pub const MAX_RETRIES: u32 = 3;

/// Status, `Content-Range` header and body of a finished request.
#[derive(Debug)]
pub struct HttpReply {
	pub status: StatusCode,
	pub content_range: Option<String>,
	pub body: Blob,
}

#[derive(Clone, Debug)]
pub struct HttpClient {
	client: Client,
	initial_backoff: Duration,
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
	err.is_connect() || err.is_timeout() || err.is_body()
}

fn is_retryable_status(status: StatusCode) -> bool {
	status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

impl HttpClient {
	pub fn new() -> Result<HttpClient> {
		let client = Client::builder()
			.tcp_keepalive(Duration::from_secs(600))
			.timeout(Duration::from_secs(120))
			.use_rustls_tls()
			.build()?;
		Ok(HttpClient {
			client,
			initial_backoff: Duration::from_secs(1),
		})
	}

	/// Overrides the first retry delay, doubling from there.
	pub fn with_initial_backoff(mut self, backoff: Duration) -> HttpClient {
		self.initial_backoff = backoff;
		self
	}

	/// `GET`s `url`, optionally restricted to `range`.
	pub async fn get(&self, url: &Url, range: Option<&ByteRange>) -> Result<HttpReply> {
		for attempt in 0..=MAX_RETRIES {
			if attempt > 0 {
				let backoff = self.initial_backoff * (1 << (attempt - 1));
				log::warn!("retry attempt {attempt}/{MAX_RETRIES} for '{url}', waiting {backoff:?}");
				sleep(backoff).await;
			}

			let mut request = self.client.get(url.clone());
			if let Some(range) = range {
				request = request.header(header::RANGE, format!("bytes={}-{}", range.offset, range.end() - 1));
			}

			let response = match request.send().await {
				Ok(r) => r,
				Err(e) if is_retryable_error(&e) && attempt < MAX_RETRIES => {
					log::warn!("retryable error: {e}");
					continue;
				}
				Err(e) => return Err(e.into()),
			};

			let status = response.status();
			if is_retryable_status(status) && attempt < MAX_RETRIES {
				log::warn!("retryable status {status} from '{url}'");
				continue;
			}

			let content_range = response
				.headers()
				.get(header::CONTENT_RANGE)
				.and_then(|v| v.to_str().ok())
				.map(str::to_owned);

			let bytes = match response.bytes().await {
				Ok(b) => b,
				Err(e) if is_retryable_error(&e) && attempt < MAX_RETRIES => {
					log::warn!("retryable error reading response body: {e}");
					continue;
				}
				Err(e) => return Err(e.into()),
			};

			return Ok(HttpReply {
				status,
				content_range,
				body: Blob::from(&*bytes),
			});
		}

		bail!("request to '{url}' failed after {MAX_RETRIES} retries")
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn retryable_statuses() {
		assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
		assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
		assert!(!is_retryable_status(StatusCode::NOT_FOUND));
		assert!(!is_retryable_status(StatusCode::PARTIAL_CONTENT));
	}

	#[tokio::test]
	async fn unreachable_host_fails_after_retries() {
		let client = HttpClient::new().unwrap().with_initial_backoff(Duration::from_millis(1));
		let url = Url::parse("http://127.0.0.1:9/Norder0/Dir0/Npix0.jpg").unwrap();
		assert!(client.get(&url, None).await.is_err());
	}
}
