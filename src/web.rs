use std::time::Duration;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Extracted pages shorter than this are not worth a model call.
pub const MIN_EXTRACTED_LEN: usize = 150;

static SCRIPT_BLOCKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script.*?</script>").expect("static script pattern"));
static STYLE_BLOCKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style.*?</style>").expect("static style pattern"));
static TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("static tag pattern"));

/// Download a page and return its visible text.
pub async fn fetch_page_text(url: &str) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Page returned HTTP {}", status);
    }

    let html = response.text().await.context("Failed to read page body")?;
    let text = extract_visible_text(&html);
    debug!("Extracted {} characters of text from {}", text.len(), url);

    Ok(text)
}

/// Strip script/style blocks and markup, then collapse whitespace runs into
/// single spaces.
pub fn extract_visible_text(html: &str) -> String {
    let without_scripts = SCRIPT_BLOCKS.replace_all(html, " ");
    let without_styles = STYLE_BLOCKS.replace_all(&without_scripts, " ");
    let without_tags = TAGS.replace_all(&without_styles, " ");

    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_body_text_and_drops_markup() {
        let html = "<html><body><p>Hello <b>world</b></p></body></html>";
        assert_eq!(extract_visible_text(html), "Hello world");
    }

    #[test]
    fn test_script_and_style_contents_are_removed() {
        let html = concat!(
            "<head><style>p { color: red; }</style>",
            "<script>alert('x');</script></head>",
            "<body><p>Visible paragraph</p></body>",
        );
        assert_eq!(extract_visible_text(html), "Visible paragraph");
    }

    #[test]
    fn test_whitespace_runs_collapse_to_single_spaces() {
        let html = "<div>one\n\n   two</div>\t<div>three</div>";
        assert_eq!(extract_visible_text(html), "one two three");
    }

    #[test]
    fn test_unclosed_script_still_strips_tags() {
        let html = "<script>var x = 1; <p>leftover</p>";
        // The open script block never closes, so only tag stripping applies.
        assert_eq!(extract_visible_text(html), "var x = 1; leftover");
    }
}
