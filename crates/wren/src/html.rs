use std::fmt::{self, Write};

use indexmap::IndexMap;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(HtmlElement),
    /// Text content, escaped when rendered.
    Text(String),
    /// Markup written out verbatim.
    ///
    /// Only post bodies from the site's own index end up here.
    Raw(String),
}

impl From<HtmlElement> for Node {
    fn from(value: HtmlElement) -> Self {
        Self::Element(value)
    }
}

impl Node {
    fn text_content(&self, out: &mut String) {
        match self {
            Node::Element(element) => {
                for child in &element.children {
                    child.text_content(out);
                }
            }
            Node::Text(text) => out.push_str(text),
            Node::Raw(markup) => out.push_str(markup),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(element) => write!(f, "{element}"),
            Node::Text(text) => f.write_str(&escape_text(text)),
            Node::Raw(markup) => f.write_str(markup),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlElement {
    pub tag_name: String,
    pub attrs: IndexMap<String, String>,
    pub children: Vec<Node>,
}

impl HtmlElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag_name: tag.into(),
            attrs: IndexMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr<V>(mut self, name: impl Into<String>, value: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.set_attr(name, value);
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<N>(mut self, children: impl IntoIterator<Item = N>) -> Self
    where
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn set_attr<V>(&mut self, name: impl Into<String>, value: impl Into<Option<V>>)
    where
        V: Into<String>,
    {
        let name = name.into();
        match value.into() {
            Some(value) => {
                *self.attrs.entry(name).or_default() = value.into();
            }
            None => {
                self.attrs.shift_remove(&name);
            }
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .map(|classes| classes.split_whitespace().any(|name| name == class))
            .unwrap_or(false)
    }

    /// Adds or removes `class` depending on `present`, like `classList.toggle(class, force)`.
    pub fn toggle_class(&mut self, class: &str, present: bool) {
        let mut classes = self
            .get_attr("class")
            .map(|classes| {
                classes
                    .split_whitespace()
                    .filter(|name| *name != class)
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        if present {
            classes.push(class.to_owned());
        }

        if classes.is_empty() {
            self.set_attr::<String>("class", None);
        } else {
            self.set_attr("class", classes.join(" "));
        }
    }

    /// Replaces every child with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    /// Replaces every child with trusted, unescaped markup.
    pub fn set_raw_html(&mut self, markup: impl Into<String>) {
        self.children = vec![Node::Raw(markup.into())];
    }

    pub fn replace_children<N>(&mut self, children: impl IntoIterator<Item = N>)
    where
        N: Into<Node>,
    {
        self.children = children.into_iter().map(Into::into).collect();
    }

    pub fn append_child(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            child.text_content(&mut out);
        }
        out
    }

    pub fn inner_html(&self) -> String {
        self.children.iter().map(ToString::to_string).collect()
    }

    /// Returns the direct element children.
    pub fn element_children(&self) -> impl Iterator<Item = &HtmlElement> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            _ => None,
        })
    }

    pub fn render_to_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for HtmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag_name)?;

        for (name, value) in &self.attrs {
            write!(f, r#" {name}="{}""#, escape_attr(value))?;
        }

        f.write_char('>')?;

        if VOID_ELEMENTS.contains(&self.tag_name.as_str()) {
            return Ok(());
        }

        for child in &self.children {
            write!(f, "{child}")?;
        }

        write!(f, "</{}>", self.tag_name)
    }
}

impl HtmlElement {
    pub fn id<V>(self, id: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.attr("id", id)
    }

    pub fn class<V>(self, class: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.attr("class", class)
    }

    pub fn href<V>(self, href: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.attr("href", href)
    }

    pub fn value<V>(self, value: impl Into<Option<V>>) -> Self
    where
        V: Into<String>,
    {
        self.attr("value", value)
    }
}

pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Decodes character references in source text into plain text.
///
/// Handles the named references HTML serializers emit plus numeric ones;
/// anything else is kept as written.
pub fn decode_entities(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        rest = &rest[start..];

        let Some(end) = rest.find(';').filter(|end| *end <= 10) else {
            decoded.push('&');
            rest = &rest[1..];
            continue;
        };

        let entity = &rest[1..end];
        let ch = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" | "#39" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };

        match ch {
            Some(ch) => {
                decoded.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                decoded.push('&');
                rest = &rest[1..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}

pub fn a() -> HtmlElement {
    HtmlElement::new("a")
}

pub fn body() -> HtmlElement {
    HtmlElement::new("body")
}

pub fn button() -> HtmlElement {
    HtmlElement::new("button")
}

pub fn code() -> HtmlElement {
    HtmlElement::new("code")
}

pub fn div() -> HtmlElement {
    HtmlElement::new("div")
}

pub fn footer() -> HtmlElement {
    HtmlElement::new("footer")
}

pub fn h1() -> HtmlElement {
    HtmlElement::new("h1")
}

pub fn h2() -> HtmlElement {
    HtmlElement::new("h2")
}

pub fn head() -> HtmlElement {
    HtmlElement::new("head")
}

pub fn html() -> HtmlElement {
    HtmlElement::new("html")
}

pub fn input() -> HtmlElement {
    HtmlElement::new("input")
}

pub fn main() -> HtmlElement {
    HtmlElement::new("main")
}

pub fn meta() -> HtmlElement {
    HtmlElement::new("meta")
}

pub fn option() -> HtmlElement {
    HtmlElement::new("option")
}

pub fn p() -> HtmlElement {
    HtmlElement::new("p")
}

pub fn section() -> HtmlElement {
    HtmlElement::new("section")
}

pub fn select() -> HtmlElement {
    HtmlElement::new("select")
}

pub fn span() -> HtmlElement {
    HtmlElement::new("span")
}

pub fn title() -> HtmlElement {
    HtmlElement::new("title")
}
