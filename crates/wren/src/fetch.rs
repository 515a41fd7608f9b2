use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{header, Request};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid URL for '{path}': {message}")]
    InvalidUrl { path: String, message: String },

    #[error("HTTP error: {0}")]
    Http(String),
}

/// The response to a fetch: a status code and the raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
        }
    }

    pub fn not_found() -> Self {
        Self::with_status(404)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Retrieves files of the site by their path, e.g. `/posts/posts.json`.
///
/// Implementations never serve a cached copy.
pub trait Fetch {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<FetchResponse, FetchError>>;
}

impl<F: Fetch> Fetch for &F {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<FetchResponse, FetchError>> {
        (**self).fetch(path)
    }
}

/// Serves the site from a directory on disk.
pub struct DiskFetcher {
    root_path: PathBuf,
}

impl DiskFetcher {
    pub fn new(root_path: impl AsRef<Path>) -> Self {
        Self {
            root_path: root_path.as_ref().to_owned(),
        }
    }

    /// Maps a site path onto the root directory. Paths that would escape the
    /// root resolve to nothing.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));

        let mut resolved = self.root_path.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return None,
            }
        }

        Some(resolved)
    }
}

impl Fetch for DiskFetcher {
    async fn fetch(&self, path: &str) -> Result<FetchResponse, FetchError> {
        let Some(file_path) = self.resolve(path) else {
            return Ok(FetchResponse::not_found());
        };

        let response = match tokio::fs::read(&file_path).await {
            Ok(body) => FetchResponse::ok(body),
            Err(err) if err.kind() == io::ErrorKind::NotFound => FetchResponse::not_found(),
            Err(err) => return Err(err.into()),
        };

        tracing::debug!(path, status = response.status, "read {file_path:?}");

        Ok(response)
    }
}

/// Fetches the site over plain HTTP.
pub struct HttpFetcher {
    origin: Url,
    client: Client<HttpConnector, Empty<Bytes>>,
}

impl HttpFetcher {
    /// Returns a new [`HttpFetcher`] resolving paths against `origin`.
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, path: &str) -> Result<FetchResponse, FetchError> {
        let url = self
            .origin
            .join(path)
            .map_err(|err| FetchError::InvalidUrl {
                path: path.to_string(),
                message: err.to_string(),
            })?;

        let request = Request::get(url.as_str())
            .header(header::CACHE_CONTROL, "no-store")
            .body(Empty::<Bytes>::new())
            .map_err(|err| FetchError::InvalidUrl {
                path: path.to_string(),
                message: err.to_string(),
            })?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|err| FetchError::Http(err.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|err| FetchError::Http(err.to_string()))?
            .to_bytes();

        tracing::debug!(path, status, "fetched {url}");

        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Response(FetchResponse),
    Unreachable,
}

/// Serves fixed responses and records every requested path.
///
/// Paths without a response are answered with a 404.
#[derive(Debug, Default)]
pub struct InMemoryFetcher {
    entries: HashMap<String, Entry>,
    requests: Mutex<Vec<String>>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(self, path: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.with_response(path, FetchResponse::ok(body))
    }

    pub fn with_response(mut self, path: impl Into<String>, response: FetchResponse) -> Self {
        self.entries.insert(path.into(), Entry::Response(response));
        self
    }

    /// Makes requests for `path` fail before any response arrives.
    pub fn with_unreachable(mut self, path: impl Into<String>) -> Self {
        self.entries.insert(path.into(), Entry::Unreachable);
        self
    }

    /// Every path requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Fetch for InMemoryFetcher {
    async fn fetch(&self, path: &str) -> Result<FetchResponse, FetchError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(path.to_string());
        }

        match self.entries.get(path) {
            Some(Entry::Response(response)) => Ok(response.clone()),
            Some(Entry::Unreachable) => Err(FetchError::Http(format!(
                "connection refused while fetching {path}"
            ))),
            None => Ok(FetchResponse::not_found()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;

    use super::*;

    fn temp_site(name: &str) -> PathBuf {
        let root = std::env::temp_dir().join(format!("wren-fetch-{name}-{}", std::process::id()));
        fs::create_dir_all(root.join("posts")).unwrap();
        fs::write(root.join("posts/posts.json"), "[]").unwrap();
        root
    }

    #[tokio::test]
    async fn test_disk_fetcher_reads_files() {
        let root = temp_site("reads");
        let fetcher = DiskFetcher::new(&root);

        let response = fetcher.fetch("/posts/posts.json").await.unwrap();
        assert_eq!(response, FetchResponse::ok("[]"));

        let missing = fetcher.fetch("/posts/missing.html").await.unwrap();
        assert_eq!(missing.status, 404);

        fs::remove_dir_all(root).unwrap();
    }

    #[tokio::test]
    async fn test_disk_fetcher_stays_inside_root() {
        let root = temp_site("escape");
        let fetcher = DiskFetcher::new(root.join("posts"));

        let response = fetcher.fetch("/../posts/posts.json").await.unwrap();
        assert_eq!(response.status, 404);

        fs::remove_dir_all(root).unwrap();
    }

    #[tokio::test]
    async fn test_in_memory_fetcher_records_requests() {
        let fetcher = InMemoryFetcher::new()
            .with_file("/posts/posts.json", "[]")
            .with_response("/posts/broken.html", FetchResponse::with_status(500))
            .with_unreachable("/posts/offline.html");

        assert!(fetcher.fetch("/posts/posts.json").await.unwrap().is_success());
        assert!(!fetcher.fetch("/posts/broken.html").await.unwrap().is_success());
        assert_eq!(fetcher.fetch("/nope").await.unwrap().status, 404);
        assert!(fetcher.fetch("/posts/offline.html").await.is_err());

        assert_eq!(
            fetcher.requests(),
            vec![
                "/posts/posts.json",
                "/posts/broken.html",
                "/nope",
                "/posts/offline.html"
            ]
        );
    }
}
