use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::date::is_valid_format;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for a rendered site.
///
/// Every field has a default, so an empty TOML document is a valid config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Appended to the document title on post pages.
    pub site_name: String,

    /// The path the site is served under, e.g. `/` or `/blog/`.
    pub base_path: String,

    /// Directory (relative to `base_path`) holding the index and post bodies.
    pub posts_dir: String,

    pub index_file: String,

    /// The page that renders a single post. Any URL whose path ends with it
    /// is routed to the post view.
    pub post_page: String,

    pub enable_pinned: bool,

    pub enable_tag_filter: bool,

    /// How many tag chips a listing card shows. `"all"` disables the limit.
    #[serde(deserialize_with = "deserialize_chip_limit")]
    pub chip_limit: Option<usize>,

    /// A `chrono` format string.
    #[serde(deserialize_with = "deserialize_date_format")]
    pub date_format: String,

    #[serde(deserialize_with = "deserialize_timezone")]
    pub timezone: Tz,

    pub copy_feedback_ms: u64,

    pub messages: Messages,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_name: "Blog".to_string(),
            base_path: "/".to_string(),
            posts_dir: "posts".to_string(),
            index_file: "posts.json".to_string(),
            post_page: "post.html".to_string(),
            enable_pinned: true,
            enable_tag_filter: true,
            chip_limit: Some(3),
            date_format: "%b %-d, %Y".to_string(),
            timezone: Tz::UTC,
            copy_feedback_ms: 1200,
            messages: Messages::default(),
        }
    }
}

impl SiteConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;

        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn copy_feedback(&self) -> Duration {
        Duration::from_millis(self.copy_feedback_ms)
    }

    /// Returns `base_path` with exactly one leading and one trailing slash.
    pub fn base_path(&self) -> String {
        let trimmed = self.base_path.trim_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        }
    }

    /// Resolves a path relative to the site root.
    pub fn site_path(&self, relative: &str) -> String {
        format!("{}{}", self.base_path(), relative.trim_start_matches('/'))
    }

    /// Resolves a file inside the posts directory.
    pub fn posts_path(&self, file: &str) -> String {
        let file = file.trim_start_matches('/');
        match self.posts_dir.trim_matches('/') {
            "" => self.site_path(file),
            dir => self.site_path(&format!("{dir}/{file}")),
        }
    }

    pub fn index_path(&self) -> String {
        self.posts_path(&self.index_file)
    }
}

/// User-visible text the renderer writes into the page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub not_found_title: String,
    pub missing_slug: String,
    /// Followed by the requested slug.
    pub unknown_slug: String,
    /// Followed by the post's body file.
    pub body_unavailable: String,
    pub error_title: String,
    pub error_text: String,
    pub copy: String,
    pub copied: String,
    pub copy_failed: String,
    pub read_more: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            not_found_title: "Post not found".to_string(),
            missing_slug: "This link doesn't name a post.".to_string(),
            unknown_slug: "No post in the index has this slug:".to_string(),
            body_unavailable: "Couldn't load the post body:".to_string(),
            error_title: "Error".to_string(),
            error_text: "Something went wrong while loading the posts. Check the console."
                .to_string(),
            copy: "Copy".to_string(),
            copied: "Copied".to_string(),
            copy_failed: "Failed".to_string(),
            read_more: "Read →".to_string(),
        }
    }
}

fn deserialize_chip_limit<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LimitOrKeyword {
        Limit(usize),
        Keyword(String),
    }

    match LimitOrKeyword::deserialize(deserializer)? {
        LimitOrKeyword::Limit(limit) => Ok(Some(limit)),
        LimitOrKeyword::Keyword(keyword) if keyword == "all" => Ok(None),
        LimitOrKeyword::Keyword(keyword) => Err(D::Error::custom(format!(
            "expected a number or \"all\", found \"{keyword}\""
        ))),
    }
}

fn deserialize_date_format<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let format = String::deserialize(deserializer)?;
    if !is_valid_format(&format) {
        return Err(D::Error::custom(format!("invalid date format '{format}'")));
    }

    Ok(format)
}

fn deserialize_timezone<'de, D>(deserializer: D) -> Result<Tz, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let name = String::deserialize(deserializer)?;
    name.parse::<Tz>()
        .map_err(|_| D::Error::custom(format!("unknown time zone '{name}'")))
}
