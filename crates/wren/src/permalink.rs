use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::config::SiteConfig;

/// Characters left alone when encoding a URI component, matching
/// `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_uri_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Returns the link to the post page showing the post with `slug`.
pub fn post_href(config: &SiteConfig, slug: &str) -> String {
    format!(
        "{}?slug={}",
        config.site_path(&config.post_page),
        encode_uri_component(slug)
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("hello-world"), "hello-world");
        assert_eq!(encode_uri_component("a b&c=d/e"), "a%20b%26c%3Dd%2Fe");
        assert_eq!(encode_uri_component("it's(ok)!"), "it's(ok)!");
        assert_eq!(encode_uri_component("러스트"), "%EB%9F%AC%EC%8A%A4%ED%8A%B8");
    }

    #[test]
    fn test_post_href() {
        let mut config = SiteConfig::default();
        assert_eq!(post_href(&config, "hello world"), "/post.html?slug=hello%20world");

        config.base_path = "/blog/".to_string();
        assert_eq!(post_href(&config, "hello"), "/blog/post.html?slug=hello");
    }
}
