use std::time::Duration;

use url::Url;

use crate::clock::{Clock, SystemClock};
use crate::config::{Messages, SiteConfig};
use crate::content::load_posts;
use crate::dom::Document;
use crate::enhance::{
    activate_copy_control, remove_copy_control, Clipboard, CopyControlId, CopyState,
};
use crate::fetch::Fetch;
use crate::highlight::Highlight;
use crate::html::{h2, p, section, HtmlElement};
use crate::listing::ListingView;
use crate::post_view::{mount_post, PostOutcome};
use crate::render::{RenderContext, RenderError};
use crate::route::PageKind;
use crate::timer::TimerTask;

/// A blog whose index and post bodies are read through a [`Fetch`].
pub struct Site<F> {
    config: SiteConfig,
    fetcher: F,
    clock: Box<dyn Clock>,
    highlighter: Option<Box<dyn Highlight>>,
}

impl Site<()> {
    pub fn builder() -> SiteBuilder<()> {
        SiteBuilder::new()
    }
}

impl<F: Fetch> Site<F> {
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Renders the page at `url` into the page layout its route expects.
    pub async fn visit(&self, url: &Url) -> Visit<'_, F> {
        let document = Document::for_page(PageKind::for_url(&self.config, url));
        self.visit_with(url, document).await
    }

    /// Renders the page at `url` into the given document.
    ///
    /// Any failure is logged and shown as an error block at the end of the
    /// page; nothing else is rendered after it.
    pub async fn visit_with(&self, url: &Url, mut document: Document) -> Visit<'_, F> {
        let view = match self.render(url, &mut document).await {
            Ok(view) => view,
            Err(err) => {
                tracing::error!(url = %url, error = %err, "failed to render page");

                document.append_block(error_block(&self.config.messages));
                View::Failed
            }
        };

        Visit {
            site: self,
            document,
            view,
        }
    }

    async fn render(&self, url: &Url, document: &mut Document) -> Result<View, RenderError> {
        let index = load_posts(&self.config, &self.fetcher).await?;

        let mut ctx = RenderContext {
            config: &self.config,
            document,
            url,
            clock: self.clock.as_ref(),
            fetcher: &self.fetcher,
            highlighter: self.highlighter.as_deref(),
        };

        let kind = PageKind::for_url(&self.config, url);
        tracing::debug!(?kind, url = %url, "rendering page");

        match kind {
            PageKind::Listing => Ok(View::Listing(ListingView::mount(&mut ctx, &index)?)),
            PageKind::Post => Ok(View::Post(mount_post(&mut ctx, &index).await?)),
        }
    }
}

fn error_block(messages: &Messages) -> HtmlElement {
    section()
        .class("card")
        .child(h2().class("card__title").text(messages.error_title.clone()))
        .child(p().class("card__text").text(messages.error_text.clone()))
}

/// What a visited page is showing.
#[derive(Debug)]
pub enum View {
    Listing(ListingView),
    Post(PostOutcome),
    /// Rendering failed and the page shows the error block.
    Failed,
}

/// A rendered page that can still be interacted with.
pub struct Visit<'a, F> {
    site: &'a Site<F>,
    document: Document,
    view: View,
}

impl<'a, F> Visit<'a, F> {
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn html(&self) -> Result<String, RenderError> {
        self.document.to_html()
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// Types into the search box of a listing page.
    ///
    /// Returns the number of posts shown, or `None` if this isn't a listing.
    pub fn search(&mut self, query: &str) -> Result<Option<usize>, RenderError> {
        match &mut self.view {
            View::Listing(listing) => listing
                .set_query(&mut self.document, &self.site.config, query)
                .map(Some),
            _ => Ok(None),
        }
    }

    /// Picks a tag in the tag select of a listing page.
    ///
    /// Returns the number of posts shown, or `None` if this isn't a listing.
    pub fn select_tag(&mut self, tag: &str) -> Result<Option<usize>, RenderError> {
        match &mut self.view {
            View::Listing(listing) => listing
                .set_tag(&mut self.document, &self.site.config, tag)
                .map(Some),
            _ => Ok(None),
        }
    }

    /// Clicks a code block's copy control.
    pub async fn activate_copy(
        &mut self,
        id: CopyControlId,
        clipboard: &impl Clipboard,
    ) -> Option<CopyState> {
        let config = &self.site.config;
        activate_copy_control(
            &mut self.document,
            id,
            clipboard,
            &config.messages,
            config.copy_feedback(),
        )
        .await
    }

    pub fn remove_copy_control(&mut self, id: CopyControlId) -> Result<bool, RenderError> {
        remove_copy_control(&mut self.document, id)
    }

    /// Lets `by` pass on the page, running any timers that come due.
    pub fn advance_time(&mut self, by: Duration) -> Vec<TimerTask> {
        self.document.advance_time(by)
    }
}

pub struct SiteBuilder<T> {
    state: T,
}

impl SiteBuilder<()> {
    pub fn new() -> Self {
        Self { state: () }
    }

    pub fn fetcher<F: Fetch>(self, fetcher: F) -> SiteBuilder<WithFetcher<F>> {
        SiteBuilder {
            state: WithFetcher {
                fetcher,
                config: SiteConfig::default(),
                clock: None,
                highlighter: None,
            },
        }
    }
}

impl Default for SiteBuilder<()> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct WithFetcher<F> {
    fetcher: F,
    config: SiteConfig,
    clock: Option<Box<dyn Clock>>,
    highlighter: Option<Box<dyn Highlight>>,
}

impl<F: Fetch> SiteBuilder<WithFetcher<F>> {
    pub fn config(mut self, config: SiteConfig) -> Self {
        self.state.config = config;
        self
    }

    /// Sets the clock used for the year placeholder.
    ///
    /// Defaults to the system clock in the configured time zone.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.state.clock = Some(Box::new(clock));
        self
    }

    pub fn highlighter(mut self, highlighter: impl Highlight + 'static) -> Self {
        self.state.highlighter = Some(Box::new(highlighter));
        self
    }

    pub fn build(self) -> Site<F> {
        let WithFetcher {
            fetcher,
            config,
            clock,
            highlighter,
        } = self.state;

        let clock = clock.unwrap_or_else(|| Box::new(SystemClock::new(config.timezone)));

        Site {
            config,
            fetcher,
            clock,
            highlighter,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use crate::clock::FixedClock;
    use crate::dom::mounts;
    use crate::fetch::{FetchResponse, InMemoryFetcher};

    use super::*;

    const INDEX: &str = r#"[{ "slug": "a", "title": "A", "date": "2024-01-01", "file": "a.html" }]"#;

    fn site(fetcher: InMemoryFetcher) -> Site<InMemoryFetcher> {
        Site::builder()
            .fetcher(fetcher)
            .clock(FixedClock(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
            .build()
    }

    #[tokio::test]
    async fn test_routes_by_path() {
        let site = site(
            InMemoryFetcher::new()
                .with_file("/posts/posts.json", INDEX)
                .with_file("/posts/a.html", "<p>A</p>"),
        );

        let listing = site.visit(&Url::parse("https://example.com/").unwrap()).await;
        assert!(matches!(listing.view(), View::Listing(_)));

        let post = site
            .visit(&Url::parse("https://example.com/post.html?slug=a").unwrap())
            .await;
        assert!(matches!(post.view(), View::Post(PostOutcome::Rendered { .. })));
        assert_eq!(post.document().title(), "A • Blog");
    }

    #[tokio::test]
    async fn test_failed_index_shows_error_block() {
        let site = site(
            InMemoryFetcher::new().with_response("/posts/posts.json", FetchResponse::with_status(500)),
        );

        let visit = site.visit(&Url::parse("https://example.com/").unwrap()).await;

        assert!(matches!(visit.view(), View::Failed));
        assert_eq!(
            visit.document().appended_blocks(),
            &[error_block(&Messages::default())]
        );
        assert_eq!(visit.document().get(mounts::YEAR).unwrap().text_content(), "");
        assert!(visit.html().unwrap().ends_with(concat!(
            r#"<section class="card"><h2 class="card__title">Error</h2>"#,
            r#"<p class="card__text">Something went wrong while loading the posts. Check the console.</p>"#,
            "</section></div></body></html>"
        )));
    }

    #[tokio::test]
    async fn test_missing_mount_shows_error_block() {
        let site = site(InMemoryFetcher::new().with_file("/posts/posts.json", INDEX));

        let visit = site
            .visit_with(&Url::parse("https://example.com/").unwrap(), Document::new("Bare"))
            .await;

        assert!(matches!(visit.view(), View::Failed));
        assert_eq!(visit.document().appended_blocks().len(), 1);
    }

    #[tokio::test]
    async fn test_interactions_outside_listing() {
        let site = site(InMemoryFetcher::new().with_file("/posts/posts.json", INDEX));

        let mut visit = site
            .visit(&Url::parse("https://example.com/post.html").unwrap())
            .await;

        assert!(matches!(visit.view(), View::Post(PostOutcome::MissingSlug)));
        assert_eq!(visit.search("rust").unwrap(), None);
        assert_eq!(visit.select_tag("go").unwrap(), None);
    }
}
