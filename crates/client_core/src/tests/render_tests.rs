use super::*;
use shared::domain::{ClientId, TalkId};

fn comment(text: &str, created_at: i64, author: Option<&str>) -> Comment {
    Comment {
        id: None,
        talk_id: TalkId::new("talk-1"),
        text: text.to_string(),
        client_id: Some(ClientId::generate()),
        created_at,
        created_by: author.map(str::to_string),
    }
}

fn timestamps(ordered: &[&Comment]) -> Vec<i64> {
    ordered.iter().map(|c| c.created_at).collect()
}

#[test]
fn display_order_is_newest_first() {
    let comments = vec![
        comment("a", 10, None),
        comment("b", 30, None),
        comment("c", 20, None),
    ];
    assert_eq!(timestamps(&display_order(&comments)), [30, 20, 10]);
}

#[test]
fn display_order_is_stable_across_renders() {
    let comments = vec![
        comment("a", 5, None),
        comment("b", 1, None),
        comment("c", 9, None),
        comment("d", 3, None),
    ];
    let first = timestamps(&display_order(&comments));
    let second = timestamps(&display_order(&comments));
    assert_eq!(first, second);
    assert_eq!(first, [9, 5, 3, 1]);
    assert_eq!(comments[0].created_at, 5, "stored order is untouched");
}

#[test]
fn markdown_bodies_render_to_html() {
    let html = markdown_to_html("**bold** and `code`");
    assert_eq!(html, "<p><strong>bold</strong> and <code>code</code></p>\n");
}

#[test]
fn raw_html_in_bodies_is_escaped() {
    let html = markdown_to_html("hi <script>alert(1)</script>");
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}

#[test]
fn markdown_plain_rendering_drops_markup() {
    assert_eq!(
        markdown_to_plain("# Title\n\nsome *emphasis*\n\n- one\n- two"),
        "Title\nsome emphasis\none\ntwo"
    );
}

#[test]
fn loading_view_shows_indicator_only() {
    let state = ViewState {
        loading: true,
        ..ViewState::default()
    };
    let html = render_html(&ThreadView {
        talk_name: "Rust <3",
        state: &state,
        modal_visible: false,
    });
    assert!(html.contains("<h1 class=\"heading\">Rust &lt;3</h1>"));
    assert!(html.contains(LOADING_TEXT));
    assert!(!html.contains(EMPTY_TEXT));
    assert!(!html.contains("comment-modal"));
}

#[test]
fn loaded_empty_view_shows_empty_message() {
    let state = ViewState {
        loaded: true,
        ..ViewState::default()
    };
    let html = render_html(&ThreadView {
        talk_name: "Talk",
        state: &state,
        modal_visible: true,
    });
    assert!(html.contains(EMPTY_TEXT));
    assert!(!html.contains(LOADING_TEXT));
    assert!(html.contains("comment-modal"));
}

#[test]
fn comments_render_newest_first_with_author() {
    let state = ViewState {
        loaded: true,
        comments: vec![
            comment("older", 1, Some("ann")),
            comment("newer", 2, Some("bob")),
        ],
        ..ViewState::default()
    };
    let html = render_html(&ThreadView {
        talk_name: "Talk",
        state: &state,
        modal_visible: false,
    });
    let newer = html.find("newer").expect("newer rendered");
    let older = html.find("older").expect("older rendered");
    assert!(newer < older);
    assert!(html.contains("<p class=\"created-by\">bob</p>"));
}

#[test]
fn plain_rendering_lists_comments_and_authors() {
    let state = ViewState {
        loaded: true,
        comments: vec![
            comment("first", 1, Some("ann")),
            comment("_second_", 2, None),
        ],
        ..ViewState::default()
    };
    let text = render_plain(&ThreadView {
        talk_name: "Talk",
        state: &state,
        modal_visible: false,
    });
    assert!(text.starts_with("Talk  [New Comment]\n====\n"));
    let second = text.find("second").expect("second");
    let first = text.find("first").expect("first");
    assert!(second < first);
    assert!(text.contains("  - ann\n"));
    assert!(!text.contains(EMPTY_TEXT));
}
