use derive_more::Deref;
use thiserror::Error;

use crate::config::SiteConfig;
use crate::content::{sort_posts_by_date, unique_tags, Post};
use crate::fetch::{Fetch, FetchError};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to fetch '{path}': {source}")]
    Fetch {
        path: String,
        #[source]
        source: FetchError,
    },

    #[error("fetching '{path}' returned status {status}")]
    Status { path: String, status: u16 },

    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Every post of the site, newest first.
#[derive(Debug, Clone, Default, PartialEq, Deref)]
pub struct PostIndex(Vec<Post>);

impl PostIndex {
    /// Returns a new [`PostIndex`] holding `posts` sorted by date.
    pub fn new(mut posts: Vec<Post>) -> Self {
        sort_posts_by_date(&mut posts);
        Self(posts)
    }

    pub fn parse(json: &[u8]) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_slice(json)?))
    }

    /// Returns the first post with the given slug.
    pub fn find(&self, slug: &str) -> Option<&Post> {
        self.0.iter().find(|post| post.slug == slug)
    }

    pub fn tags(&self) -> Vec<String> {
        unique_tags(&self.0)
    }

    /// Splits the index into pinned and unpinned posts, keeping their order.
    pub fn partition_pinned(&self) -> (Vec<Post>, Vec<Post>) {
        self.0.iter().cloned().partition(Post::is_pinned)
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.0
    }
}

/// Loads the site's post index.
///
/// The whole load fails if the index can't be fetched, the response isn't a
/// success, or the body isn't a JSON array of posts.
pub async fn load_posts(config: &SiteConfig, fetcher: &impl Fetch) -> Result<PostIndex, LoadError> {
    let path = config.index_path();

    let response = fetcher
        .fetch(&path)
        .await
        .map_err(|source| LoadError::Fetch {
            path: path.clone(),
            source,
        })?;

    if !response.is_success() {
        return Err(LoadError::Status {
            path,
            status: response.status,
        });
    }

    let index = PostIndex::parse(&response.body).map_err(|source| LoadError::Parse {
        path: path.clone(),
        source,
    })?;

    tracing::debug!(path = %path, posts = index.len(), "loaded post index");

    Ok(index)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use crate::fetch::{FetchResponse, InMemoryFetcher};

    use super::*;

    const INDEX: &str = indoc! {r#"
        [
            { "slug": "hello-world", "date": "2023-07-01", "file": "hello-world.html" },
            { "slug": "happy-new-year", "date": "2024-01-01", "file": "happy-new-year.html", "pinned": true },
            { "slug": "year-in-review", "date": "2023-12-31", "file": "year-in-review.html" },
            { "slug": "hello-world", "date": "2022-01-01", "file": "duplicate.html" }
        ]
    "#};

    fn slugs(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|post| post.slug.as_str()).collect()
    }

    #[tokio::test]
    async fn test_load_posts_sorts_newest_first() {
        let fetcher = InMemoryFetcher::new().with_file("/posts/posts.json", INDEX);

        let index = load_posts(&SiteConfig::default(), &fetcher).await.unwrap();

        assert_eq!(
            slugs(&index),
            vec!["happy-new-year", "year-in-review", "hello-world", "hello-world"]
        );
        assert_eq!(fetcher.requests(), vec!["/posts/posts.json"]);
    }

    #[tokio::test]
    async fn test_find_returns_first_match() {
        let fetcher = InMemoryFetcher::new().with_file("/posts/posts.json", INDEX);

        let index = load_posts(&SiteConfig::default(), &fetcher).await.unwrap();

        assert_eq!(
            index.find("hello-world").map(|post| post.file.as_str()),
            Some("hello-world.html")
        );
        assert_eq!(index.find("missing"), None);
    }

    #[test]
    fn test_partition_pinned() {
        let index = PostIndex::parse(INDEX.as_bytes()).unwrap();

        let (pinned, normal) = index.partition_pinned();

        assert_eq!(slugs(&pinned), vec!["happy-new-year"]);
        assert_eq!(
            slugs(&normal),
            vec!["year-in-review", "hello-world", "hello-world"]
        );
    }

    #[tokio::test]
    async fn test_unsuccessful_response_fails_the_load() {
        let fetcher = InMemoryFetcher::new()
            .with_response("/posts/posts.json", FetchResponse::with_status(503));

        let err = load_posts(&SiteConfig::default(), &fetcher).await.unwrap_err();

        assert!(matches!(err, LoadError::Status { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_mistyped_records_still_load() {
        let fetcher = InMemoryFetcher::new().with_file(
            "/posts/posts.json",
            indoc! {r#"
                [
                    { "slug": "hello-world", "date": "2023-07-01", "readingTime": "4" },
                    { "slug": "untitled", "date": null, "title": null, "tags": null },
                    { "slug": "odd-tags", "date": "2024-01-01", "tags": ["rust", 7, null] }
                ]
            "#},
        );

        let index = load_posts(&SiteConfig::default(), &fetcher).await.unwrap();

        assert_eq!(slugs(&index), vec!["odd-tags", "hello-world", "untitled"]);
        assert_eq!(
            index.find("hello-world").map(Post::reading_time_label),
            Some("4".to_string())
        );
        assert_eq!(index.find("untitled").map(|post| post.title.as_str()), Some(""));
        assert_eq!(index.tags(), vec!["7".to_string(), "rust".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_json_fails_the_load() {
        let fetcher = InMemoryFetcher::new().with_file("/posts/posts.json", "{ not json");

        let err = load_posts(&SiteConfig::default(), &fetcher).await.unwrap_err();

        assert!(matches!(err, LoadError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_index_fails_the_load() {
        let fetcher = InMemoryFetcher::new().with_unreachable("/posts/posts.json");

        let err = load_posts(&SiteConfig::default(), &fetcher).await.unwrap_err();

        assert!(matches!(err, LoadError::Fetch { .. }));
    }
}
