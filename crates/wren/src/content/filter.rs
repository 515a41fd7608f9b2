use crate::content::Post;

/// The search and tag inputs of the listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    query: String,
    tag: String,
}

impl PostFilter {
    pub fn new(query: &str, tag: &str) -> Self {
        let mut filter = Self::default();
        filter.set_query(query);
        filter.set_tag(tag);
        filter
    }

    /// Sets the free-text query. Surrounding whitespace is ignored and
    /// matching is case-insensitive.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.trim().to_lowercase();
    }

    /// Sets the selected tag. An empty tag matches every post.
    pub fn set_tag(&mut self, tag: &str) {
        self.tag = tag.to_string();
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.matches_query(post) && self.matches_tag(post)
    }

    fn matches_query(&self, post: &Post) -> bool {
        if self.query.is_empty() {
            return true;
        }

        let haystack = format!(
            "{} {} {}",
            post.title,
            post.summary(),
            post.tags().join(" ")
        )
        .to_lowercase();

        haystack.contains(&self.query)
    }

    fn matches_tag(&self, post: &Post) -> bool {
        self.tag.is_empty() || post.has_tag(&self.tag)
    }

    /// Returns the matching posts, in their original order.
    pub fn apply<'a>(&self, posts: &'a [Post]) -> Vec<&'a Post> {
        posts.iter().filter(|post| self.matches(post)).collect()
    }
}
