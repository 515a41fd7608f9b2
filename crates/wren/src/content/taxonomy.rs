use std::collections::BTreeSet;

use crate::content::Post;

/// Collects every tag used by `posts`, deduplicated and in ascending order.
pub fn unique_tags<'a>(posts: impl IntoIterator<Item = &'a Post>) -> Vec<String> {
    posts
        .into_iter()
        .flat_map(|post| post.tags())
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_post(tags: Option<&[&str]>) -> Post {
        Post {
            tags: tags.map(|tags| tags.iter().map(|tag| tag.to_string()).collect()),
            ..Default::default()
        }
    }

    #[test]
    fn test_unique_tags() {
        let posts = vec![
            make_post(Some(&["rust", "web"])),
            make_post(None),
            make_post(Some(&["go", "rust", "rust"])),
            make_post(Some(&[])),
        ];

        assert_eq!(unique_tags(&posts), vec!["go", "rust", "web"]);
    }

    #[test]
    fn test_unique_tags_of_nothing() {
        assert!(unique_tags(&Vec::<Post>::new()).is_empty());
    }
}
