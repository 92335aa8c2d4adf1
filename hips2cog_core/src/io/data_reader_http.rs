//! Range reads over HTTP(S), used to probe COGs published on a web server.
//!
//! Every read is one `Range` request. The answer must be `206 Partial Content` with a
//! `Content-Range` header matching the requested bytes.

use super::{DataReaderTrait, HttpClient};
use crate::{Blob, ByteRange};
use anyhow::{Context, Result, anyhow, bail, ensure};
use async_trait::async_trait;
use regex::{Regex, RegexBuilder};
use reqwest::{StatusCode, Url};
use std::sync::{
	LazyLock,
	atomic::{AtomicU64, Ordering},
};

#[derive(Debug)]
pub struct DataReaderHttp {
	client: HttpClient,
	name: String,
	url: Url,
	size: AtomicU64,
}

impl DataReaderHttp {
	pub fn from_url(url: Url) -> Result<Box<DataReaderHttp>> {
		match url.scheme() {
			"http" | "https" => (),
			other => bail!("unsupported URL scheme '{other}' in '{url}', expected 'http' or 'https'"),
		}

		Ok(Box::new(DataReaderHttp {
			client: HttpClient::new()?,
			name: url.to_string(),
			url,
			size: AtomicU64::new(0),
		}))
	}
}

/// Parses `bytes <start>-<end>/<total>` into `(start, end, total)`. `total` may be `*`.
fn parse_content_range(value: &str) -> Result<(u64, u64, Option<u64>)> {
	static RE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
		RegexBuilder::new(r"^bytes (\d+)-(\d+)/(\d+|\*)$")
			.case_insensitive(true)
			.build()
			.unwrap_or_else(|e| panic!("invalid Content-Range pattern: {e}"))
	});

	let caps = RE_RANGE
		.captures(value.trim())
		.ok_or_else(|| anyhow!("unexpected Content-Range format: '{value}', expected 'bytes <start>-<end>/<total>'"))?;
	let total = match &caps[3] {
		"*" => None,
		total => Some(total.parse()?),
	};
	Ok((caps[1].parse()?, caps[2].parse()?, total))
}

#[async_trait]
impl DataReaderTrait for DataReaderHttp {
	async fn read_range(&self, range: &ByteRange) -> Result<Blob> {
		ensure!(range.length > 0, "cannot request an empty range from '{}'", self.url);

		let reply = self
			.client
			.get(&self.url, Some(range))
			.await
			.with_context(|| format!("reading range {range} from '{}'", self.url))?;

		if reply.status != StatusCode::PARTIAL_CONTENT {
			bail!("expected HTTP 206 (Partial Content) from '{}', got {}", self.url, reply.status);
		}

		let content_range = reply
			.content_range
			.ok_or_else(|| anyhow!("response from '{}' is missing Content-Range header", self.url))?;
		let (start, end, total) = parse_content_range(&content_range)?;

		ensure!(start == range.offset, "Content-Range start mismatch: expected {}, got {start}", range.offset);
		let expected_end = range.end() - 1;
		ensure!(end == expected_end, "Content-Range end mismatch: expected {expected_end}, got {end}");
		ensure!(
			reply.body.len() == range.length,
			"expected {} bytes from '{}', got {}",
			range.length,
			self.url,
			reply.body.len()
		);

		if let Some(total) = total {
			self.size.store(total, Ordering::Relaxed);
		}
		Ok(reply.body)
	}

	fn get_size(&self) -> u64 {
		self.size.load(Ordering::Relaxed)
	}

	fn get_name(&self) -> &str {
		&self.name
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn from_url() {
		assert!(DataReaderHttp::from_url(Url::parse("https://example.org/3.tif").unwrap()).is_ok());
		assert!(DataReaderHttp::from_url(Url::parse("ftp://example.org/3.tif").unwrap()).is_err());

		let reader = DataReaderHttp::from_url(Url::parse("https://example.org/3.tif").unwrap()).unwrap();
		assert_eq!(reader.get_name(), "https://example.org/3.tif");
		assert_eq!(reader.get_size(), 0);
	}

	#[rstest]
	#[case("bytes 0-15/1024", (0, 15, Some(1024)))]
	#[case("Bytes 100-199/*", (100, 199, None))]
	fn content_range(#[case] input: &str, #[case] expected: (u64, u64, Option<u64>)) {
		assert_eq!(parse_content_range(input).unwrap(), expected);
	}

	#[test]
	fn content_range_rejects_garbage() {
		assert!(parse_content_range("items 0-1/2").is_err());
		assert!(parse_content_range("bytes 5/10").is_err());
	}
}
