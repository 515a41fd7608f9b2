use thiserror::Error;
use url::Url;

use crate::clock::Clock;
use crate::config::SiteConfig;
use crate::content::LoadError;
use crate::date::format_date;
use crate::dom::{mounts, Document};
use crate::highlight::Highlight;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("page has no element with id '{0}'")]
    MissingMount(String),

    #[error("failed to rewrite markup: {0}")]
    Rewrite(String),
}

/// Everything a view needs to render into a page.
pub struct RenderContext<'a, F> {
    pub config: &'a SiteConfig,
    pub document: &'a mut Document,
    pub url: &'a Url,
    pub clock: &'a dyn Clock,
    pub fetcher: &'a F,
    pub highlighter: Option<&'a dyn Highlight>,
}

impl<'a, F> RenderContext<'a, F> {
    /// Formats a post date with the site's format and time zone.
    pub fn format_date(&self, date: &str) -> String {
        format_date(date, &self.config.date_format, self.config.timezone)
    }

    /// Writes the current year into the page's year placeholder.
    pub fn set_year(&mut self) -> Result<(), RenderError> {
        let year = self.clock.year();
        self.document.mount(mounts::YEAR)?.set_text(year.to_string());
        Ok(())
    }
}
