//! HTML console pages to plain text.
//!
//! Matrix views sometimes serve the console wrapped in an HTML page. The
//! error scan works on text, so the markup is dropped and every text node is
//! concatenated in document order.

use scraper::Html;

/// Whether a `Content-Type` header value denotes HTML.
pub fn is_html(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().contains("html")
}

pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    document.root_element().text().collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_html() {
        assert!(is_html("text/html;charset=utf-8"));
        assert!(is_html("application/xhtml+xml"));
        assert!(!is_html("text/plain;charset=UTF-8"));
    }

    #[test]
    fn test_html_to_text_keeps_line_structure() {
        let html = "<html><body><pre>step 1\nERROR: <b>boom</b>\nSTOP\n</pre></body></html>";
        let text = html_to_text(html);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines.contains(&"ERROR: boom"));
        assert!(lines.contains(&"STOP"));
    }

    #[test]
    fn test_html_to_text_decodes_entities() {
        let text = html_to_text("<pre>a &amp; b &gt; c</pre>");
        assert!(text.contains("a & b > c"));
    }
}
