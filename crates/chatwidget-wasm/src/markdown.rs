use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Relative URLs and http(s)/mailto links are allowed
fn is_safe_url(url: &str) -> bool {
    // Browsers ignore whitespace and control characters inside a scheme
    let url: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    match url.find(':') {
        None => true,
        Some(colon) => {
            let scheme = &url[..colon];
            scheme.contains(['/', '?', '#']) || SAFE_SCHEMES.contains(&scheme)
        }
    }
}

fn strip_unsafe_url(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) {
        url
    } else {
        log::warn!("Dropping unsafe link target in reply");
        CowStr::Borrowed("")
    }
}

/// Render markdown to HTML
pub fn render_markdown(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    // Raw HTML from the backend is shown as text
    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: strip_unsafe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: strip_unsafe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}

/// Render a reply, as markdown or as escaped plain text
pub fn render_reply(content: &str, use_markdown: bool) -> String {
    if use_markdown {
        render_markdown(content)
    } else {
        crate::utils::escape_html(content).replace('\n', "<br>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown() {
        let html = render_markdown("# Hello\n\nThis is **bold** text.");
        assert!(html.contains("<h1>"));
        assert!(html.contains("<strong>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_markdown("hi <script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_script_links_lose_their_target() {
        let html = render_markdown("[x](javascript:alert(1)) and [y](JavaScript:alert(2))");
        assert!(!html.to_lowercase().contains("javascript:"));
        assert!(html.contains(r#"<a href="">x</a>"#));

        let html = render_markdown("![img](data:text/html,boom)");
        assert!(!html.contains("data:"));
    }

    #[test]
    fn test_web_links_are_kept() {
        let html = render_markdown("[docs](https://example.com/a:b) [rel](/chat?x=1:2) [me](mailto:a@b.c)");
        assert!(html.contains(r#"href="https://example.com/a:b""#));
        assert!(html.contains(r#"href="/chat?x=1:2""#));
        assert!(html.contains(r#"href="mailto:a@b.c""#));
    }

    #[test]
    fn test_plain_reply() {
        assert_eq!(render_reply("a < b\nc", false), "a &lt; b<br>c");
    }
}
