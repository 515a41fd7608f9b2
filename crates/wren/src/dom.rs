use std::collections::BTreeMap;
use std::time::Duration;

use indexmap::IndexMap;

use crate::enhance::{render_copy_labels, CopyControl, CopyControlId};
use crate::html::{self, div, footer, h1, input, option, p, section, select, span, HtmlElement};
use crate::render::RenderError;
use crate::route::PageKind;
use crate::timer::{TimerTask, Timers};

/// Ids of the elements the renderer writes into.
pub mod mounts {
    pub const YEAR: &str = "year";
    pub const POSTS: &str = "posts";
    pub const EMPTY: &str = "empty";
    pub const SEARCH: &str = "search";
    pub const TAG_FILTER: &str = "tagFilter";
    pub const TAG_CHIPS: &str = "tagChips";
    pub const PINNED_POSTS: &str = "pinnedPosts";
    pub const TITLE: &str = "title";
    pub const META: &str = "meta";
    pub const SUMMARY: &str = "summary";
    pub const CHIPS: &str = "chips";
    pub const CONTENT: &str = "content";
}

/// A headless stand-in for the host page.
///
/// The page is a flat, ordered set of mount points addressed by id, followed
/// by any blocks appended to the page container.
#[derive(Debug, Default)]
pub struct Document {
    title: String,
    mounts: IndexMap<String, HtmlElement>,
    appended: Vec<HtmlElement>,
    pub(crate) copy_controls: BTreeMap<CopyControlId, CopyControl>,
    pub(crate) next_copy_control: usize,
    pub(crate) timers: Timers,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Adds a mount point, keyed by the element's `id`.
    ///
    /// Elements without an `id` can't be addressed and are ignored.
    pub fn with_mount(mut self, element: HtmlElement) -> Self {
        if let Some(id) = element.get_attr("id").map(str::to_owned) {
            self.mounts.insert(id, element);
        }
        self
    }

    /// The page for the given kind, with every mount point the renderer
    /// expects.
    pub fn for_page(kind: PageKind) -> Self {
        match kind {
            PageKind::Listing => Self::listing_page(),
            PageKind::Post => Self::post_page(),
        }
    }

    pub fn listing_page() -> Self {
        Self::new("Blog")
            .with_mount(
                input()
                    .id(mounts::SEARCH)
                    .attr("type", "search")
                    .attr("placeholder", "Search")
                    .value(""),
            )
            .with_mount(
                select()
                    .id(mounts::TAG_FILTER)
                    .child(option().value("").attr("selected", "").text("All tags")),
            )
            .with_mount(div().id(mounts::TAG_CHIPS).class("chips"))
            .with_mount(section().id(mounts::PINNED_POSTS).class("pinned"))
            .with_mount(section().id(mounts::POSTS).class("posts"))
            .with_mount(p().id(mounts::EMPTY).class("empty hidden").text("No posts match."))
            .with_mount(footer().id(mounts::YEAR))
    }

    pub fn post_page() -> Self {
        Self::new("Blog")
            .with_mount(p().id(mounts::META).class("kicker"))
            .with_mount(h1().id(mounts::TITLE).class("post-title"))
            .with_mount(p().id(mounts::SUMMARY).class("post-summary"))
            .with_mount(div().id(mounts::CHIPS).class("chips"))
            .with_mount(HtmlElement::new("article").id(mounts::CONTENT).class("content"))
            .with_mount(span().id(mounts::YEAR))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn get(&self, id: &str) -> Option<&HtmlElement> {
        self.mounts.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut HtmlElement> {
        self.mounts.get_mut(id)
    }

    /// Returns the mount point with `id`, failing if the page lacks it.
    pub fn mount(&mut self, id: &str) -> Result<&mut HtmlElement, RenderError> {
        self.mounts
            .get_mut(id)
            .ok_or_else(|| RenderError::MissingMount(id.to_string()))
    }

    /// Appends a block to the end of the page container.
    pub fn append_block(&mut self, element: HtmlElement) {
        self.appended.push(element);
    }

    pub fn appended_blocks(&self) -> &[HtmlElement] {
        &self.appended
    }

    pub fn copy_controls(&self) -> impl Iterator<Item = &CopyControl> {
        self.copy_controls.values()
    }

    pub fn copy_control(&self, id: CopyControlId) -> Option<&CopyControl> {
        self.copy_controls.get(&id)
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Moves the page's clock forward and runs every task that came due.
    ///
    /// Returns the tasks that ran.
    pub fn advance_time(&mut self, by: Duration) -> Vec<TimerTask> {
        let mut ran = Vec::new();

        for (timer, task) in self.timers.advance(by) {
            match task {
                TimerTask::ResetCopyLabel(id) => {
                    let Some(control) = self.copy_controls.get_mut(&id) else {
                        continue;
                    };

                    if control.reset_timer() == Some(timer) {
                        control.reset();
                        ran.push(task);
                    }
                }
            }
        }

        ran
    }

    /// Renders the whole page.
    pub fn to_html(&self) -> Result<String, RenderError> {
        let container = div()
            .class("container")
            .children(self.mounts.values().cloned())
            .children(self.appended.iter().cloned());

        let page = html::html().child(
            html::head()
                .child(html::meta().attr("charset", "utf-8"))
                .child(html::title().text(self.title.clone())),
        );
        let page = page.child(html::body().child(container));

        let rendered = format!("<!DOCTYPE html>{page}");

        if self.copy_controls.is_empty() {
            return Ok(rendered);
        }

        render_copy_labels(&rendered, &self.copy_controls)
    }
}
