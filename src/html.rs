//! Small HTML fragment builders.
//!
//! Content arguments are inserted verbatim so fragments can nest; callers
//! escape catalog text with [`escape_text`] first. Attribute values are
//! always escaped.

use std::borrow::Cow;

pub const TAG_HEADERS: &str = "h5";
pub const TAG_LIST_ITEM: &str = "li";
pub const TAG_UNORDERED_LIST: &str = "ul";

/// Parameters for [`html_div`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Div<'a> {
    pub id: Option<&'a str>,
    pub class: Option<&'a str>,
    pub content: Option<&'a str>,
}

/// Parameters for [`html_link`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Link<'a> {
    pub id: Option<&'a str>,
    pub class: Option<&'a str>,
    pub href: Option<&'a str>,
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
}

/// Escape `&`, `<`, `>` and quotes for text and attribute positions.
pub fn escape_text(raw: &str) -> Cow<'_, str> {
    if !raw.contains(|c: char| matches!(c, '&' | '<' | '>' | '"' | '\'')) {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

fn push_attr(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_text(value));
        out.push('"');
    }
}

/// `<div id=".." class="..">content</div>`
pub fn html_div(div: &Div<'_>) -> String {
    let content = div.content.unwrap_or_default();
    let mut out = String::with_capacity(32 + content.len());
    out.push_str("<div");
    push_attr(&mut out, "id", div.id);
    push_attr(&mut out, "class", div.class);
    out.push('>');
    out.push_str(content);
    out.push_str("</div>");
    out
}

/// `<a id=".." class=".." href="..">content</a>`
pub fn html_link(link: &Link<'_>) -> String {
    let content = link.content.unwrap_or_default();
    let mut out = String::with_capacity(48 + content.len());
    out.push_str("<a");
    push_attr(&mut out, "id", link.id);
    push_attr(&mut out, "class", link.class);
    push_attr(&mut out, "href", link.href);
    push_attr(&mut out, "title", link.title);
    out.push('>');
    out.push_str(content);
    out.push_str("</a>");
    out
}

pub fn html_element(tag: &str, content: &str) -> String {
    format!("<{tag}>{content}</{tag}>")
}

pub fn html_list_item(content: &str) -> String {
    html_element(TAG_LIST_ITEM, content)
}

/// List item wrapping a hash link; `hash` is given without the leading `#`.
pub fn html_list_item_link(content: &str, hash: &str) -> String {
    let href = format!("#{}", hash);
    html_list_item(&html_link(&Link {
        href: Some(&href),
        content: Some(content),
        ..Link::default()
    }))
}

/// Named in-page anchor for a volume section.
pub fn html_anchor(volume_id: u32) -> String {
    format!("<a name=\"v{}\" />", volume_id)
}
