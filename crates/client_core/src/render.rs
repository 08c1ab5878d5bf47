//! Thread rendering.
//!
//! Comment bodies are markdown. Raw HTML inside a body is escaped rather
//! than passed through, so a comment can never inject markup into the page.

use pulldown_cmark::{html::push_html, Event, Options, Parser, TagEnd};
use shared::domain::Comment;

use crate::state::ViewState;

pub const LOADING_TEXT: &str = "Loading...";
pub const EMPTY_TEXT: &str = "No Comments.";
pub const NEW_COMMENT_TEXT: &str = "New Comment";

#[derive(Debug, Clone, Copy)]
pub struct ThreadView<'a> {
    pub talk_name: &'a str,
    pub state: &'a ViewState,
    pub modal_visible: bool,
}

/// Newest first. Sorts oldest-first and reverses, so the stored order is
/// never consulted and repeated renders agree.
pub fn display_order(comments: &[Comment]) -> Vec<&Comment> {
    let mut ordered: Vec<&Comment> = comments.iter().collect();
    ordered.sort_by_key(|comment| comment.created_at);
    ordered.reverse();
    ordered
}

fn options() -> Options {
    Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES | Options::ENABLE_TASKLISTS
}

pub fn markdown_to_html(text: &str) -> String {
    let events = Parser::new_ext(text, options()).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut html = String::new();
    push_html(&mut html, events);
    html
}

pub fn markdown_to_plain(text: &str) -> String {
    let mut out = String::new();
    for event in Parser::new_ext(text, options()) {
        match event {
            Event::Text(text)
            | Event::Code(text)
            | Event::Html(text)
            | Event::InlineHtml(text) => out.push_str(&text),
            Event::SoftBreak | Event::HardBreak => out.push('\n'),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote,
            ) => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
    out.trim_end().to_string()
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub fn render_html(view: &ThreadView<'_>) -> String {
    let mut html = String::from("<div class=\"talk-comments\">\n");
    html.push_str("<div class=\"header\">\n");
    html.push_str(&format!(
        "<h1 class=\"heading\">{}</h1>\n",
        escape_html(view.talk_name)
    ));
    html.push_str(&format!(
        "<div class=\"comment-button\"><p class=\"comment-button-text\">{NEW_COMMENT_TEXT}</p></div>\n"
    ));
    html.push_str("</div>\n");

    if view.state.loading {
        html.push_str(&format!("<h2>{LOADING_TEXT}</h2>\n"));
    }
    let ordered = display_order(&view.state.comments);
    if view.state.loaded && ordered.is_empty() {
        html.push_str(&format!("<p class=\"no-comments\">{EMPTY_TEXT}</p>\n"));
    }
    for comment in ordered {
        html.push_str("<div class=\"comment\">\n");
        html.push_str(&markdown_to_html(&comment.text));
        html.push_str(&format!(
            "<p class=\"created-by\">{}</p>\n",
            escape_html(comment.created_by.as_deref().unwrap_or_default())
        ));
        html.push_str("</div>\n");
    }
    if view.modal_visible {
        html.push_str("<div class=\"comment-modal\"></div>\n");
    }
    html.push_str("</div>\n");
    html
}

pub fn render_plain(view: &ThreadView<'_>) -> String {
    let mut out = format!("{}  [{NEW_COMMENT_TEXT}]\n", view.talk_name);
    out.push_str(&"=".repeat(view.talk_name.chars().count().max(1)));
    out.push('\n');

    if view.state.loading {
        out.push_str(LOADING_TEXT);
        out.push('\n');
    }
    let ordered = display_order(&view.state.comments);
    if view.state.loaded && ordered.is_empty() {
        out.push_str(EMPTY_TEXT);
        out.push('\n');
    }
    for comment in ordered {
        out.push('\n');
        out.push_str(&markdown_to_plain(&comment.text));
        out.push('\n');
        if let Some(author) = comment.created_by.as_deref() {
            out.push_str(&format!("  - {author}\n"));
        }
    }
    if view.modal_visible {
        out.push_str("\n[composing new comment]\n");
    }
    out
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
