use std::cell::RefCell;
use std::rc::Rc;

use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, text, RewriteStrSettings};
use once_cell::sync::Lazy;
use regex::Regex;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use thiserror::Error;

use crate::html::decode_entities;

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

static LANGUAGE_CLASS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)(?:language|lang)-([\w+#-]+)")
        .expect("failed to compile regex for code block languages")
});

/// Marks code blocks that were already highlighted.
const HIGHLIGHTED_ATTR: &str = "data-highlighted";

#[derive(Error, Debug)]
pub enum HighlightError {
    #[error("failed to highlight {language}: {message}")]
    Syntax { language: String, message: String },

    #[error("failed to rewrite markup: {0}")]
    Rewrite(String),
}

/// A syntax highlighter run over the code blocks of a post body.
pub trait Highlight {
    /// Returns `markup` with its `pre code` blocks highlighted.
    fn highlight(&self, markup: &str) -> Result<String, HighlightError>;
}

/// Highlights code blocks with `syntect`, emitting class-based markup.
///
/// The language comes from a `language-*` or `lang-*` class on the `code`
/// element; blocks without one are left as they are.
pub struct SyntectHighlighter {
    class_style: ClassStyle,
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new(ClassStyle::SpacedPrefixed { prefix: "hl-" })
    }
}

impl SyntectHighlighter {
    pub fn new(class_style: ClassStyle) -> Self {
        Self { class_style }
    }
}

#[derive(Default)]
struct CodeState {
    language: Option<String>,
    buffer: String,
    error: Option<HighlightError>,
}

impl Highlight for SyntectHighlighter {
    fn highlight(&self, markup: &str) -> Result<String, HighlightError> {
        let state = Rc::new(RefCell::new(CodeState::default()));

        let highlighted = rewrite_str(
            markup,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!("pre code", {
                        let state = Rc::clone(&state);
                        move |el| {
                            let mut state = state.borrow_mut();
                            state.buffer.clear();
                            state.language = None;

                            if el.has_attribute(HIGHLIGHTED_ATTR) {
                                return Ok(());
                            }

                            let language = el.get_attribute("class").and_then(|classes| {
                                LANGUAGE_CLASS_REGEX
                                    .captures(&classes)
                                    .map(|captures| captures[1].to_string())
                            });

                            if let Some(language) = language {
                                if find_syntax(&SYNTAX_SET, &language).is_some() {
                                    el.set_attribute(HIGHLIGHTED_ATTR, "yes")?;
                                    state.language = Some(language);
                                }
                            }

                            Ok(())
                        }
                    }),
                    text!("pre code", {
                        let state = Rc::clone(&state);
                        move |chunk| {
                            let mut state = state.borrow_mut();
                            let Some(language) = state.language.clone() else {
                                return Ok(());
                            };

                            state.buffer.push_str(chunk.as_str());

                            if !chunk.last_in_text_node() {
                                chunk.remove();
                                return Ok(());
                            }

                            let code = decode_entities(&std::mem::take(&mut state.buffer));
                            match highlight_code(&language, &code, self.class_style) {
                                Ok(html) => chunk.replace(&html, ContentType::Html),
                                Err(err) => {
                                    state.error.get_or_insert(err);
                                }
                            }

                            Ok(())
                        }
                    }),
                ],
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|err| HighlightError::Rewrite(err.to_string()))?;

        if let Some(err) = state.borrow_mut().error.take() {
            return Err(err);
        }

        Ok(highlighted)
    }
}

/// Highlights a single snippet of code, returning the inner markup of its
/// `code` element.
pub fn highlight_code(
    language: &str,
    code: &str,
    class_style: ClassStyle,
) -> Result<String, HighlightError> {
    let syntax_set = &*SYNTAX_SET;
    let syntax =
        find_syntax(syntax_set, language).unwrap_or_else(|| syntax_set.find_syntax_plain_text());

    let ends_with_newline = code.ends_with('\n');
    let mut code_with_newline = code.to_string();
    if !ends_with_newline {
        code_with_newline.push('\n');
    }

    let mut generator = ClassedHTMLGenerator::new_with_class_style(syntax, syntax_set, class_style);

    for line in LinesWithEndings::from(code_with_newline.as_str()) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|err| HighlightError::Syntax {
                language: language.to_string(),
                message: err.to_string(),
            })?;
    }

    let mut highlighted = generator.finalize();

    if !ends_with_newline {
        if let Some(newline) = highlighted.rfind('\n') {
            highlighted.remove(newline);
        }
    }

    Ok(highlighted)
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(token))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}
