//! One-shot auto-repair for bracket labels containing whitespace
//!
//! Mermaid rejects some unquoted labels such as `A[hello world]` depending on
//! their contents. The repair wraps the trimmed label in quotes:
//! `A["hello world"]`. Labels that already contain a quote or are blank are
//! left alone. Other label delimiters (`(...)`, `{...}`) are not
//! touched.

use regex::{Captures, Regex};
use std::sync::OnceLock;
use tracing::debug;

fn bracket_label() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\[([^"\]\n]*\s[^"\]\n]*)\]"#).expect("bracket label pattern is valid")
    })
}

/// A rewritten definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repair {
    pub text: String,
    pub labels_quoted: usize,
}

/// Quote every `[...]` label that contains whitespace and no quote.
///
/// Returns `None` when nothing would change.
///
/// ```rust
/// use ariel_view::core::quote_bracket_labels;
///
/// let repair = quote_bracket_labels("flowchart TD\n A[hello world]").unwrap();
/// assert_eq!(repair.text, "flowchart TD\n A[\"hello world\"]");
/// assert!(quote_bracket_labels("flowchart TD\n A[\"hello world\"]").is_none());
/// ```
pub fn quote_bracket_labels(definition: &str) -> Option<Repair> {
    let mut labels_quoted = 0;
    let text = bracket_label().replace_all(definition, |caps: &Captures<'_>| {
        let trimmed = caps[1].trim();
        if trimmed.is_empty() {
            caps[0].to_string()
        } else {
            labels_quoted += 1;
            format!("[\"{trimmed}\"]")
        }
    });

    if labels_quoted == 0 {
        return None;
    }

    debug!(labels_quoted, "Quoted bracket labels");
    Some(Repair {
        text: text.into_owned(),
        labels_quoted,
    })
}
