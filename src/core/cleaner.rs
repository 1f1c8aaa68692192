//! Normalizes scraped page text before it is sent to the LLM.

use regex::{Captures, Regex};
use std::sync::LazyLock;

static HIDDEN_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(?:script|style|noscript)\b[^>]*>.*?</(?:script|style|noscript)\s*>")
        .expect("hidden block pattern is valid")
});
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment pattern is valid"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[/!?]?[A-Za-z][^<>]*>").expect("tag pattern is valid"));
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:nbsp|amp|lt|gt|quot|apos|#39|#160);").expect("entity pattern is valid")
});
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://\S+").expect("url pattern is valid"));
static INVISIBLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\u{200B}-\u{200D}\u{2060}\u{FEFF}\u{00AD}]").expect("invisible pattern is valid")
});
static SPACE_LIKE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Cc}\u{00A0}\u{2000}-\u{200A}\u{202F}\u{205F}\u{3000}]")
        .expect("space pattern is valid")
});
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

fn decode_entity(caps: &Captures) -> &'static str {
    match &caps[0] {
        "&amp;" => "&",
        "&lt;" => "<",
        "&gt;" => ">",
        "&quot;" => "\"",
        "&apos;" | "&#39;" => "'",
        _ => " ",
    }
}

fn clean_pass(text: &str) -> String {
    let text = HIDDEN_BLOCK_RE.replace_all(text, " ");
    let text = COMMENT_RE.replace_all(&text, " ");
    let text = TAG_RE.replace_all(&text, " ");
    let text = ENTITY_RE.replace_all(&text, decode_entity);
    let text = URL_RE.replace_all(&text, " ");
    let text = INVISIBLE_RE.replace_all(&text, "");
    let text = SPACE_LIKE_RE.replace_all(&text, " ");
    let text = WHITESPACE_RE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Strips markup remnants, URLs and invisible characters, then collapses
/// whitespace. Idempotent: `clean_text(&clean_text(x)) == clean_text(x)`.
pub fn clean_text(raw: &str) -> String {
    // 解碼實體可能產生新的標籤，所以重複直到不再變化
    let mut current = clean_pass(raw);
    loop {
        let next = clean_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
