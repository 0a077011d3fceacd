use scraper::{Html, Selector};

/// A point-in-time capture of the current view
///
/// Carries the visible page text plus the texts of any dedicated inline
/// error elements, which the rate-limit detector scans separately from the
/// page body.
#[derive(Debug, Clone, Default)]
pub struct ViewSnapshot {
    /// Visible text of the whole view
    pub text: String,

    /// Texts of dedicated inline error elements, in document order
    pub error_messages: Vec<String>,
}

/// Selectors that mark dedicated inline error surfaces in the feed UI
const ERROR_SELECTORS: [&str; 3] = [
    "[role='alert']",
    "[data-testid='error-detail']",
    "[data-testid='empty_state_header_text']",
];

impl ViewSnapshot {
    /// Builds a snapshot from raw page HTML
    ///
    /// Extracts the document's visible text and collects the text of every
    /// element matching a known error-surface selector.
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);

        let text = document
            .root_element()
            .text()
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let mut error_messages = Vec::new();
        for selector_str in ERROR_SELECTORS {
            if let Ok(selector) = Selector::parse(selector_str) {
                for element in document.select(&selector) {
                    let message = element
                        .text()
                        .map(str::trim)
                        .filter(|chunk| !chunk.is_empty())
                        .collect::<Vec<_>>()
                        .join(" ");
                    if !message.is_empty() {
                        error_messages.push(message);
                    }
                }
            }
        }

        Self {
            text,
            error_messages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_html_extracts_visible_text() {
        let html = r#"<html><body><div>markets</div><div>rallied</div></body></html>"#;
        let snap = ViewSnapshot::from_html(html);
        assert_eq!(snap.text, "markets rallied");
        assert!(snap.error_messages.is_empty());
    }

    #[test]
    fn test_from_html_collects_alert_elements() {
        let html = r#"
            <html><body>
                <div>feed content</div>
                <div role="alert">Rate limit exceeded</div>
                <span data-testid="error-detail">Too many requests today</span>
            </body></html>
        "#;
        let snap = ViewSnapshot::from_html(html);
        assert_eq!(snap.error_messages.len(), 2);
        assert_eq!(snap.error_messages[0], "Rate limit exceeded");
        assert_eq!(snap.error_messages[1], "Too many requests today");
        // Alert text is also part of the page text
        assert!(snap.text.contains("Rate limit exceeded"));
    }

    #[test]
    fn test_from_html_skips_empty_alerts() {
        let html = r#"<html><body><div role="alert">   </div></body></html>"#;
        let snap = ViewSnapshot::from_html(html);
        assert!(snap.error_messages.is_empty());
    }
}
