use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;
use std::rc::Rc;
use std::sync::Mutex;
use std::time::Duration;

use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, text, RewriteStrSettings};
use thiserror::Error;

use crate::config::Messages;
use crate::dom::{mounts, Document};
use crate::highlight::Highlight;
use crate::html::{button, decode_entities};
use crate::render::RenderError;
use crate::timer::{TimerId, TimerTask};

const COPY_BUTTON_CLASS: &str = "copy-btn";
const COPIED_CLASS: &str = "copied";
const COPY_ID_ATTR: &str = "data-copy-id";

#[derive(Error, Debug)]
#[error("clipboard write rejected: {0}")]
pub struct ClipboardError(pub String);

/// The system clipboard.
pub trait Clipboard {
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>>;
}

/// A clipboard held in memory, optionally refusing every write.
#[derive(Debug, Default)]
pub struct InMemoryClipboard {
    contents: Mutex<Option<String>>,
    rejects: bool,
}

impl InMemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clipboard that rejects writes, like a browser without
    /// clipboard permission.
    pub fn rejecting() -> Self {
        Self {
            rejects: true,
            ..Default::default()
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .ok()
            .and_then(|contents| contents.clone())
    }
}

impl Clipboard for InMemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.rejects {
            return Err(ClipboardError("permission denied".to_string()));
        }

        let mut contents = self
            .contents
            .lock()
            .map_err(|_| ClipboardError("poisoned".to_string()))?;
        *contents = Some(text.to_string());

        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct CopyControlId(pub usize);

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CopyState {
    Idle,
    Copied,
    Failed,
}

/// The "Copy" button attached to a code block.
#[derive(Debug, Clone)]
pub struct CopyControl {
    id: CopyControlId,
    text: String,
    state: CopyState,
    label: String,
    idle_label: String,
    reset: Option<TimerId>,
}

impl CopyControl {
    fn new(id: CopyControlId, text: String, idle_label: &str) -> Self {
        Self {
            id,
            text,
            state: CopyState::Idle,
            label: idle_label.to_string(),
            idle_label: idle_label.to_string(),
            reset: None,
        }
    }

    pub fn id(&self) -> CopyControlId {
        self.id
    }

    /// The plain text of the code block.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> CopyState {
        self.state
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn reset_timer(&self) -> Option<TimerId> {
        self.reset
    }

    pub(crate) fn reset(&mut self) {
        self.state = CopyState::Idle;
        self.label = self.idle_label.clone();
        self.reset = None;
    }
}

#[derive(Debug, Default, Clone)]
struct CodeBlock {
    has_code: bool,
    has_control: bool,
    text: String,
}

/// Highlights the post body and gives every code block a copy control.
///
/// Blocks that already carry a control are left alone, so running this again
/// never adds a second one. Returns the number of controls added.
pub fn enhance_code_blocks(
    document: &mut Document,
    highlighter: Option<&dyn Highlight>,
    messages: &Messages,
) -> Result<usize, RenderError> {
    let mut markup = document.mount(mounts::CONTENT)?.inner_html();

    if let Some(highlighter) = highlighter {
        match highlighter.highlight(&markup) {
            Ok(highlighted) => markup = highlighted,
            Err(err) => tracing::warn!(error = %err, "skipping syntax highlighting"),
        }
    }

    let blocks = scan_code_blocks(&markup)?;

    let mut assigned = Vec::with_capacity(blocks.len());
    for block in blocks {
        if !block.has_code || block.has_control {
            assigned.push(None);
            continue;
        }

        let id = CopyControlId(document.next_copy_control);
        document.next_copy_control += 1;
        document.copy_controls.insert(
            id,
            CopyControl::new(id, decode_entities(&block.text), &messages.copy),
        );
        assigned.push(Some(id));
    }

    let added = assigned.iter().flatten().count();
    if added > 0 {
        markup = append_copy_buttons(&markup, &assigned, &messages.copy)?;
    }

    document.mount(mounts::CONTENT)?.set_raw_html(markup);

    tracing::debug!(added, "enhanced code blocks");

    Ok(added)
}

fn scan_code_blocks(markup: &str) -> Result<Vec<CodeBlock>, RenderError> {
    let blocks = Rc::new(RefCell::new(Vec::<CodeBlock>::new()));

    rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("pre", {
                    let blocks = Rc::clone(&blocks);
                    move |_el| {
                        blocks.borrow_mut().push(CodeBlock::default());
                        Ok(())
                    }
                }),
                element!("pre code", {
                    let blocks = Rc::clone(&blocks);
                    move |_el| {
                        if let Some(block) = blocks.borrow_mut().last_mut() {
                            block.has_code = true;
                        }
                        Ok(())
                    }
                }),
                element!("pre .copy-btn", {
                    let blocks = Rc::clone(&blocks);
                    move |_el| {
                        if let Some(block) = blocks.borrow_mut().last_mut() {
                            block.has_control = true;
                        }
                        Ok(())
                    }
                }),
                text!("pre code", {
                    let blocks = Rc::clone(&blocks);
                    move |chunk| {
                        if let Some(block) = blocks.borrow_mut().last_mut() {
                            block.text.push_str(chunk.as_str());
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Rewrite(err.to_string()))?;

    let blocks = Rc::try_unwrap(blocks)
        .map(RefCell::into_inner)
        .unwrap_or_else(|rc| rc.borrow().clone());

    Ok(blocks)
}

fn append_copy_buttons(
    markup: &str,
    assigned: &[Option<CopyControlId>],
    label: &str,
) -> Result<String, RenderError> {
    let mut index = 0;

    let rewritten = rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!("pre", |el| {
                if let Some(Some(id)) = assigned.get(index) {
                    let control = button()
                        .attr("type", "button")
                        .class(COPY_BUTTON_CLASS)
                        .attr(COPY_ID_ATTR, id.0.to_string())
                        .text(label);
                    el.append(&control.render_to_string(), ContentType::Html);
                }
                index += 1;
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Rewrite(err.to_string()));

    rewritten
}

/// Writes the current label and state of every copy control into `markup`.
pub(crate) fn render_copy_labels(
    markup: &str,
    controls: &BTreeMap<CopyControlId, CopyControl>,
) -> Result<String, RenderError> {
    rewrite_str(
        markup,
        RewriteStrSettings {
            element_content_handlers: vec![element!("button.copy-btn", |el| {
                let control = el
                    .get_attribute(COPY_ID_ATTR)
                    .and_then(|id| id.parse().ok())
                    .and_then(|id| controls.get(&CopyControlId(id)));

                if let Some(control) = control {
                    el.set_inner_content(control.label(), ContentType::Text);

                    let class = if control.state() == CopyState::Copied {
                        format!("{COPY_BUTTON_CLASS} {COPIED_CLASS}")
                    } else {
                        COPY_BUTTON_CLASS.to_string()
                    };
                    el.set_attribute("class", &class)?;
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Rewrite(err.to_string()))
}

/// Copies a code block's text to the clipboard and updates its control.
///
/// On success the label switches to "copied" and a reset is scheduled after
/// `feedback`, replacing any reset still pending from an earlier activation.
/// A rejected write leaves the "failed" label in place. Returns `None` if the
/// page has no such control.
pub async fn activate_copy_control(
    document: &mut Document,
    id: CopyControlId,
    clipboard: &impl Clipboard,
    messages: &Messages,
    feedback: Duration,
) -> Option<CopyState> {
    let text = document.copy_controls.get(&id)?.text.clone();

    let result = clipboard.write_text(&text).await;

    let control = document.copy_controls.get_mut(&id)?;
    match result {
        Ok(()) => {
            if let Some(pending) = control.reset.take() {
                document.timers.cancel(pending);
            }

            control.state = CopyState::Copied;
            control.label = messages.copied.clone();
            control.reset = Some(
                document
                    .timers
                    .schedule(feedback, TimerTask::ResetCopyLabel(id)),
            );
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to copy code block");

            control.state = CopyState::Failed;
            control.label = messages.copy_failed.clone();
        }
    }

    Some(control.state)
}

/// Detaches a copy control from the page, cancelling its pending reset.
///
/// Returns `false` if there was no such control.
pub fn remove_copy_control(document: &mut Document, id: CopyControlId) -> Result<bool, RenderError> {
    let Some(control) = document.copy_controls.remove(&id) else {
        return Ok(false);
    };

    if let Some(pending) = control.reset {
        document.timers.cancel(pending);
    }

    let content = document.mount(mounts::CONTENT)?;
    let markup = rewrite_str(
        &content.inner_html(),
        RewriteStrSettings {
            element_content_handlers: vec![element!("button.copy-btn", |el| {
                if el.get_attribute(COPY_ID_ATTR).as_deref() == Some(id.0.to_string().as_str()) {
                    el.remove();
                }
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Rewrite(err.to_string()))?;

    content.set_raw_html(markup);

    Ok(true)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;

    const BODY: &str = indoc! {r#"
        <p>Some code:</p>
        <pre><code class="language-rust">fn main() {
            println!(&quot;a &lt; b&quot;);
        }</code></pre>
        <pre>plain preformatted text</pre>
        <pre><code>ls -la</code></pre>
    "#};

    fn document_with_body(body: &str) -> Document {
        let mut document = Document::post_page();
        document.mount(mounts::CONTENT).unwrap().set_raw_html(body);
        document
    }

    fn content(document: &Document) -> String {
        document.get(mounts::CONTENT).unwrap().inner_html()
    }

    #[test]
    fn test_adds_a_control_to_each_code_block() {
        let mut document = document_with_body(BODY);

        let added = enhance_code_blocks(&mut document, None, &Messages::default()).unwrap();

        assert_eq!(added, 2);
        let html = content(&document);
        assert!(html.contains(
            r#"ls -la</code><button type="button" class="copy-btn" data-copy-id="1">Copy</button></pre>"#
        ));
        assert!(html.contains(r#"<pre>plain preformatted text</pre>"#));

        let texts = document
            .copy_controls()
            .map(|control| control.text().to_string())
            .collect::<Vec<_>>();
        assert_eq!(
            texts,
            vec![
                "fn main() {\n    println!(\"a < b\");\n}".to_string(),
                "ls -la".to_string()
            ]
        );
    }

    #[test]
    fn test_enhancing_twice_adds_nothing() {
        let mut document = document_with_body(BODY);
        let messages = Messages::default();

        enhance_code_blocks(&mut document, None, &messages).unwrap();
        let first = content(&document);

        let added = enhance_code_blocks(&mut document, None, &messages).unwrap();

        assert_eq!(added, 0);
        assert_eq!(content(&document), first);
        assert_eq!(document.copy_controls().count(), 2);
        assert_eq!(content(&document).matches("copy-btn").count(), 2);
    }

    #[test]
    fn test_body_without_code_is_unchanged() {
        let mut document = document_with_body("<p>Just words.</p>");

        let added = enhance_code_blocks(&mut document, None, &Messages::default()).unwrap();

        assert_eq!(added, 0);
        assert_eq!(content(&document), "<p>Just words.</p>");
    }

    #[tokio::test]
    async fn test_copy_then_reset() {
        let mut document = document_with_body("<pre><code>cargo test</code></pre>");
        let messages = Messages::default();
        let clipboard = InMemoryClipboard::new();
        enhance_code_blocks(&mut document, None, &messages).unwrap();

        let id = CopyControlId(0);
        let state = activate_copy_control(
            &mut document,
            id,
            &clipboard,
            &messages,
            Duration::from_millis(1200),
        )
        .await;

        assert_eq!(state, Some(CopyState::Copied));
        assert_eq!(clipboard.contents().as_deref(), Some("cargo test"));
        assert_eq!(document.copy_control(id).unwrap().label(), "Copied");
        assert!(document
            .to_html()
            .unwrap()
            .contains(r#"<button type="button" class="copy-btn copied" data-copy-id="0">Copied</button>"#));

        assert!(document.advance_time(Duration::from_millis(1199)).is_empty());
        assert_eq!(
            document.advance_time(Duration::from_millis(1)),
            vec![TimerTask::ResetCopyLabel(id)]
        );
        assert_eq!(document.copy_control(id).unwrap().state(), CopyState::Idle);
        assert!(document
            .to_html()
            .unwrap()
            .contains(r#"<button type="button" class="copy-btn" data-copy-id="0">Copy</button>"#));
    }

    #[tokio::test]
    async fn test_reactivation_replaces_pending_reset() {
        let mut document = document_with_body("<pre><code>make</code></pre>");
        let messages = Messages::default();
        let clipboard = InMemoryClipboard::new();
        let feedback = Duration::from_millis(1200);
        enhance_code_blocks(&mut document, None, &messages).unwrap();

        let id = CopyControlId(0);
        activate_copy_control(&mut document, id, &clipboard, &messages, feedback).await;
        document.advance_time(Duration::from_millis(1000));
        activate_copy_control(&mut document, id, &clipboard, &messages, feedback).await;

        assert!(document.advance_time(Duration::from_millis(1000)).is_empty());
        assert_eq!(document.copy_control(id).unwrap().state(), CopyState::Copied);
        assert_eq!(document.advance_time(Duration::from_millis(200)).len(), 1);
        assert_eq!(document.copy_controls().count(), 1);
        assert_eq!(content(&document).matches("copy-btn").count(), 1);
    }

    #[tokio::test]
    async fn test_rejected_copy_shows_failure() {
        let mut document = document_with_body("<pre><code>secret</code></pre>");
        let messages = Messages::default();
        enhance_code_blocks(&mut document, None, &messages).unwrap();

        let id = CopyControlId(0);
        let state = activate_copy_control(
            &mut document,
            id,
            &InMemoryClipboard::rejecting(),
            &messages,
            Duration::from_millis(1200),
        )
        .await;

        assert_eq!(state, Some(CopyState::Failed));
        assert_eq!(document.copy_control(id).unwrap().label(), "Failed");
        assert!(document.advance_time(Duration::from_secs(10)).is_empty());
        assert_eq!(document.copy_control(id).unwrap().label(), "Failed");
    }

    #[tokio::test]
    async fn test_removed_control_never_resets() {
        let mut document = document_with_body("<pre><code>rm -rf target</code></pre>");
        let messages = Messages::default();
        enhance_code_blocks(&mut document, None, &messages).unwrap();

        let id = CopyControlId(0);
        activate_copy_control(
            &mut document,
            id,
            &InMemoryClipboard::new(),
            &messages,
            Duration::from_millis(1200),
        )
        .await;

        assert!(remove_copy_control(&mut document, id).unwrap());
        assert!(!remove_copy_control(&mut document, id).unwrap());
        assert!(!content(&document).contains("copy-btn"));
        assert!(document.advance_time(Duration::from_secs(5)).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_control() {
        let mut document = document_with_body("<p>No code.</p>");

        let state = activate_copy_control(
            &mut document,
            CopyControlId(7),
            &InMemoryClipboard::new(),
            &Messages::default(),
            Duration::from_millis(1200),
        )
        .await;

        assert_eq!(state, None);
    }
}
