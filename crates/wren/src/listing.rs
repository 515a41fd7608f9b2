use crate::config::SiteConfig;
use crate::content::{Post, PostFilter, PostIndex};
use crate::date::format_date;
use crate::dom::{mounts, Document};
use crate::html::{a, div, h2, option, p, span, HtmlElement, Node};
use crate::permalink::post_href;
use crate::render::{RenderContext, RenderError};

/// A `#tag` chip.
pub fn tag_chip(tag: &str) -> HtmlElement {
    span().class("chip").text(format!("#{tag}"))
}

/// Renders the card linking to a post from the listing.
pub fn render_post_card(config: &SiteConfig, post: &Post) -> HtmlElement {
    let date = format_date(&post.date, &config.date_format, config.timezone);
    let chips = post
        .tags()
        .iter()
        .take(config.chip_limit.unwrap_or(usize::MAX))
        .map(|tag| tag_chip(tag));

    a().class("post-card")
        .attr("data-type", post.kind())
        .href(post_href(config, &post.slug))
        .child(
            p().class("kicker")
                .text(format!("{date} · {} min", post.reading_time_label())),
        )
        .child(h2().class("post-title").text(post.title.clone()))
        .child(p().class("post-summary").text(post.summary()))
        .child(
            div()
                .class("meta-row")
                .child(div().class("chips").children(chips))
                .child(span().text(config.messages.read_more.clone())),
        )
}

/// The listing page: pinned posts rendered once, and the remaining posts
/// filtered by the search and tag inputs.
#[derive(Debug, Clone)]
pub struct ListingView {
    pinned: Vec<Post>,
    normal: Vec<Post>,
    filter: PostFilter,
}

impl ListingView {
    pub fn mount<F>(ctx: &mut RenderContext<'_, F>, index: &PostIndex) -> Result<Self, RenderError> {
        ctx.set_year()?;

        let config = ctx.config;
        let document = &mut *ctx.document;

        let (pinned, normal) = if config.enable_pinned {
            index.partition_pinned()
        } else {
            (Vec::new(), index.to_vec())
        };

        if config.enable_pinned {
            if let Some(pinned_posts) = document.get_mut(mounts::PINNED_POSTS) {
                pinned_posts
                    .replace_children(pinned.iter().map(|post| render_post_card(config, post)));
            }
        }

        let tags = index.tags();

        if config.enable_tag_filter {
            let tag_filter = document.mount(mounts::TAG_FILTER)?;
            for tag in &tags {
                tag_filter.append_child(option().value(tag.as_str()).text(format!("#{tag}")));
            }
        }

        let mut chips = Vec::with_capacity(tags.len() * 2);
        for (position, tag) in tags.iter().enumerate() {
            if position > 0 {
                chips.push(Node::Text(" ".to_string()));
            }
            chips.push(Node::Element(tag_chip(tag)));
        }
        document.mount(mounts::TAG_CHIPS)?.replace_children(chips);

        let query = document
            .mount(mounts::SEARCH)?
            .get_attr("value")
            .unwrap_or_default()
            .to_string();
        let tag = if config.enable_tag_filter {
            selected_tag(document.mount(mounts::TAG_FILTER)?)
        } else {
            String::new()
        };

        let view = Self {
            pinned,
            normal,
            filter: PostFilter::new(&query, &tag),
        };

        let shown = view.apply(document, config)?;
        tracing::debug!(
            pinned = view.pinned.len(),
            shown,
            total = index.len(),
            "mounted listing"
        );

        Ok(view)
    }

    pub fn pinned(&self) -> &[Post] {
        &self.pinned
    }

    pub fn normal(&self) -> &[Post] {
        &self.normal
    }

    pub fn filter(&self) -> &PostFilter {
        &self.filter
    }

    /// The normal posts that pass the current filter.
    pub fn visible(&self) -> Vec<&Post> {
        self.filter.apply(&self.normal)
    }

    /// Types `query` into the search input and re-filters.
    pub fn set_query(
        &mut self,
        document: &mut Document,
        config: &SiteConfig,
        query: &str,
    ) -> Result<usize, RenderError> {
        document.mount(mounts::SEARCH)?.set_attr("value", query);
        self.filter.set_query(query);
        self.apply(document, config)
    }

    /// Picks `tag` in the tag select and re-filters.
    ///
    /// Does nothing when the tag filter is disabled.
    pub fn set_tag(
        &mut self,
        document: &mut Document,
        config: &SiteConfig,
        tag: &str,
    ) -> Result<usize, RenderError> {
        if !config.enable_tag_filter {
            return Ok(self.visible().len());
        }

        let tag_filter = document.mount(mounts::TAG_FILTER)?;
        for node in &mut tag_filter.children {
            if let Node::Element(option) = node {
                let selected = option.get_attr("value").unwrap_or_default() == tag;
                option.set_attr::<&str>("selected", selected.then_some(""));
            }
        }

        self.filter.set_tag(tag);
        self.apply(document, config)
    }

    /// Re-renders the post list from the current filter.
    ///
    /// Returns the number of posts shown.
    pub fn apply(&self, document: &mut Document, config: &SiteConfig) -> Result<usize, RenderError> {
        let visible = self.visible();

        document
            .mount(mounts::POSTS)?
            .replace_children(visible.iter().map(|post| render_post_card(config, post)));
        document
            .mount(mounts::EMPTY)?
            .toggle_class("hidden", !visible.is_empty());

        Ok(visible.len())
    }
}

fn selected_tag(tag_filter: &HtmlElement) -> String {
    tag_filter
        .element_children()
        .find(|option| option.get_attr("selected").is_some())
        .and_then(|option| option.get_attr("value"))
        .unwrap_or_default()
        .to_string()
}
