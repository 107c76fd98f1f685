use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // URLs, hashtags and mentions swallow the rest of their non-space run.
    static ref MARKUP: Regex = Regex::new(r"http\S+|#\S+|@\S+").expect("valid regex");
    static ref SYMBOLS: Regex = Regex::new(&format!(
        r"[{}]|[^\x00-\x7F]",
        regex::escape(r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##)
    ))
    .expect("valid regex");
}

/// Retweet and carbon-copy markers, dropped when they stand alone.
const MARKERS: &[&str] = &["RT", "cc"];

/// Clean raw document text into a single-spaced ASCII string.
///
/// Removes URLs, hashtag and mention tokens, punctuation, non-ASCII characters
/// and standalone `RT`/`cc` markers, then collapses whitespace. Case is kept;
/// lowercasing belongs to the tokenizer. `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    let stripped = MARKUP.replace_all(raw, " ");
    let stripped = SYMBOLS.replace_all(&stripped, " ");
    stripped
        .split_whitespace()
        .filter(|tok| !MARKERS.contains(tok))
        .collect::<Vec<_>>()
        .join(" ")
}
