//! Cleans generated text before it is returned to a caller.
//!
//! Markdown decoration is removed first, then markup that could execute in a
//! browser. Removing one fragment can join its neighbours into a new match, so
//! the passes repeat until the text stops changing.

use regex::Regex;
use std::sync::LazyLock;

/// Returned whenever cleaning leaves nothing to show.
pub const FALLBACK_RESPONSE: &str =
    "I'm sorry, I couldn't process your request. Please try again.";

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid regex"));
static JAVASCRIPT_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)javascript:").expect("valid regex"));
static EVENT_HANDLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bon\w+\s*=").expect("valid regex"));
static LINE_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:[>*\-][ \t]*)+").expect("valid regex"));
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*|\*|__|_").expect("valid regex"));

/// Strips unsafe markup and markdown decoration.
///
/// Never returns an empty string: empty input or input that cleans down to
/// nothing yields [`FALLBACK_RESPONSE`].
pub fn sanitize_response(raw: &str) -> String {
    let mut text = raw.trim().to_string();
    // Every pass that changes the text makes it shorter, so this terminates.
    loop {
        let next = clean_once(&text);
        if next == text {
            break;
        }
        text = next;
    }

    if text.is_empty() {
        FALLBACK_RESPONSE.to_string()
    } else {
        text
    }
}

fn clean_once(text: &str) -> String {
    let text = LINE_MARKERS.replace_all(text, "");
    let text = EMPHASIS.replace_all(&text, "");
    let text = LINE_MARKERS.replace_all(&text, "");
    let text = SCRIPT_BLOCK.replace_all(&text, "");
    let text = JAVASCRIPT_URI.replace_all(&text, "");
    let text = EVENT_HANDLER.replace_all(&text, "");
    text.trim().to_string()
}
