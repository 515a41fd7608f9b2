use url::Url;

use crate::config::SiteConfig;

/// The kinds of page a site serves.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PageKind {
    Listing,
    Post,
}

impl PageKind {
    /// Routes a URL: paths ending with the post page show a single post,
    /// everything else shows the listing.
    pub fn for_url(config: &SiteConfig, url: &Url) -> Self {
        if url.path().ends_with(config.post_page.as_str()) {
            Self::Post
        } else {
            Self::Listing
        }
    }
}

/// Returns the `slug` query parameter, treating an empty value as absent.
pub fn slug_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "slug")
        .map(|(_, value)| value.into_owned())
        .filter(|slug| !slug.is_empty())
}
