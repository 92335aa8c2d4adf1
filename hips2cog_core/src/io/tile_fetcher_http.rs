use super::{HttpClient, TileFetcherTrait};
use crate::{Blob, HipsError};
use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};

/// Downloads tiles from a HiPS tree published on a web server.
///
/// `404 Not Found` and `410 Gone` mean the tile does not exist. Transport errors and server
/// errors are retried by [`HttpClient`] before the tile is given up as unavailable.
#[derive(Debug)]
pub struct TileFetcherHttp {
	client: HttpClient,
	base: Url,
	name: String,
}

impl TileFetcherHttp {
	pub fn new(mut base: Url) -> Result<TileFetcherHttp> {
		match base.scheme() {
			"http" | "https" => (),
			other => bail!("unsupported URL scheme '{other}' in '{base}', expected 'http' or 'https'"),
		}
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());
			base.set_path(&path);
		}
		Ok(TileFetcherHttp {
			client: HttpClient::new()?,
			name: base.to_string(),
			base,
		})
	}

	fn url(&self, location: &str) -> Result<Url> {
		Ok(self.base.join(location)?)
	}
}

#[async_trait]
impl TileFetcherTrait for TileFetcherHttp {
	async fn fetch(&self, location: &str) -> Result<Blob> {
		let url = self.url(location)?;
		let reply = match self.client.get(&url, None).await {
			Ok(reply) => reply,
			Err(e) => return Err(HipsError::unavailable(url.as_str(), format!("{e:#}")).into()),
		};
		match reply.status {
			StatusCode::OK => Ok(reply.body),
			status => Err(HipsError::unavailable(url.as_str(), format!("HTTP {status}")).into()),
		}
	}

	fn describe(&self, location: &str) -> String {
		self
			.url(location)
			.map_or_else(|_| format!("{}{location}", self.base), |url| url.to_string())
	}

	fn get_name(&self) -> &str {
		&self.name
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::time::Duration;
	use tokio::{
		io::{AsyncReadExt, AsyncWriteExt},
		net::TcpListener,
	};

	/// Serves `Npix0.jpg` with a body, `Npix1.jpg` as gone and everything else as not found.
	async fn serve_tiles() -> Result<Url> {
		let listener = TcpListener::bind("127.0.0.1:0").await?;
		let port = listener.local_addr()?.port();
		tokio::spawn(async move {
			while let Ok((mut socket, _)) = listener.accept().await {
				tokio::spawn(async move {
					let mut request = Vec::new();
					let mut buffer = [0u8; 1024];
					while !request.windows(4).any(|w| w == b"\r\n\r\n") {
						match socket.read(&mut buffer).await {
							Ok(0) | Err(_) => return,
							Ok(n) => request.extend_from_slice(&buffer[..n]),
						}
					}
					let request = String::from_utf8_lossy(&request);
					let path = request.split_whitespace().nth(1).unwrap_or_default();
					let (status, body) = match path {
						"/hips/Norder0/Dir0/Npix0.jpg" => ("200 OK", "tile bytes"),
						"/hips/Norder0/Dir0/Npix1.jpg" => ("410 Gone", ""),
						_ => ("404 Not Found", ""),
					};
					let reply = format!(
						"HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
						body.len()
					);
					let _ = socket.write_all(reply.as_bytes()).await;
				});
			}
		});
		Ok(Url::parse(&format!("http://127.0.0.1:{port}/hips"))?)
	}

	#[tokio::test]
	async fn fetches_existing_tile() -> Result<()> {
		let fetcher = TileFetcherHttp::new(serve_tiles().await?)?;
		let blob = fetcher.fetch("Norder0/Dir0/Npix0.jpg").await?;
		assert_eq!(blob.as_slice(), b"tile bytes");
		Ok(())
	}

	#[rstest]
	#[case("Norder0/Dir0/Npix1.jpg", "410")]
	#[case("Norder0/Dir0/Npix2.jpg", "404")]
	#[tokio::test]
	async fn missing_tile_is_unavailable(#[case] location: &str, #[case] status: &str) -> Result<()> {
		let fetcher = TileFetcherHttp::new(serve_tiles().await?)?;
		let error = fetcher.fetch(location).await.unwrap_err();
		match HipsError::find(&error) {
			Some(HipsError::TileUnavailable { .. }) => assert!(format!("{error:#}").contains(status), "{error:#}"),
			other => panic!("expected an unavailable tile, got {other:?}"),
		}
		Ok(())
	}

	#[test]
	fn base_gets_a_trailing_slash() -> Result<()> {
		let fetcher = TileFetcherHttp::new(Url::parse("https://example.org/surveys/DSS")?)?;
		assert_eq!(fetcher.get_name(), "https://example.org/surveys/DSS/");
		assert_eq!(
			fetcher.describe("Norder3/Dir0/Npix7.jpg"),
			"https://example.org/surveys/DSS/Norder3/Dir0/Npix7.jpg"
		);
		Ok(())
	}

	#[test]
	fn rejects_other_schemes() {
		assert!(TileFetcherHttp::new(Url::parse("ftp://example.org/DSS/").unwrap()).is_err());
	}

	#[tokio::test]
	async fn unreachable_server_means_unavailable() -> Result<()> {
		let mut fetcher = TileFetcherHttp::new(Url::parse("http://127.0.0.1:9/hips/")?)?;
		fetcher.client = fetcher.client.with_initial_backoff(Duration::from_millis(1));
		let error = fetcher.fetch("Norder0/Dir0/Npix0.jpg").await.unwrap_err();
		assert!(matches!(HipsError::find(&error), Some(HipsError::TileUnavailable { .. })));
		Ok(())
	}
}
