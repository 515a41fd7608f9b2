use crate::content::Post;

/// Sorts posts by date, in descending order (newest to oldest).
///
/// Dates are compared as strings. For `YYYY-MM-DD` dates that is the same as
/// chronological order; other formats sort however their text does. The sort
/// is stable, so posts sharing a date keep their index order.
pub fn sort_posts_by_date(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_post(slug: &str, date: &str) -> Post {
        Post {
            slug: slug.to_string(),
            date: date.to_string(),
            ..Default::default()
        }
    }

    fn slugs(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|post| post.slug.as_str()).collect()
    }

    #[test]
    fn test_sort_posts_by_date() {
        let mut posts = vec![
            make_post("hello-world", "2023-07-01"),
            make_post("happy-new-year", "2024-01-01"),
            make_post("year-in-review", "2023-12-31"),
        ];

        sort_posts_by_date(&mut posts);

        assert_eq!(
            slugs(&posts),
            vec!["happy-new-year", "year-in-review", "hello-world"]
        );
    }

    #[test]
    fn test_ties_keep_index_order() {
        let mut posts = vec![
            make_post("first", "2024-03-01"),
            make_post("older", "2024-01-01"),
            make_post("second", "2024-03-01"),
            make_post("third", "2024-03-01"),
        ];

        sort_posts_by_date(&mut posts);

        assert_eq!(slugs(&posts), vec!["first", "second", "third", "older"]);
    }

    #[test]
    fn test_dates_compare_as_text() {
        let mut posts = vec![make_post("september", "2024-9-01"), make_post("october", "2024-10-01")];

        sort_posts_by_date(&mut posts);

        // "2024-9" > "2024-1" character by character.
        assert_eq!(slugs(&posts), vec!["september", "october"]);
    }
}
