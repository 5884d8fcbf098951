//! Inline-option grammar (spec §4.K step 1, §10.5 "specified precisely since
//! spec.md names the keys but not the exact grammar"): `[k=v, k2=v2]`, keys
//! and values trimmed, last-write-wins on a duplicate key.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Known inline-option keys (spec §4.K step 1).
pub const KNOWN_KEYS: [&str; 4] = ["repo", "branch", "type", "agent"];

static BRACKET_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\[\]]*)\]").unwrap());

/// Parses every `[k=v, k2=v2]` bracket block found anywhere in `text` into a
/// flat map. Later occurrences (including a later key within the same
/// block) overwrite earlier ones. Unknown keys are kept (callers decide
/// whether to ignore them) since the grammar itself doesn't reject them.
pub fn parse_inline_options(text: &str) -> HashMap<String, String> {
    let mut options = HashMap::new();
    for block in BRACKET_BLOCK.captures_iter(text) {
        let inner = &block[1];
        for pair in inner.split(',') {
            let Some((k, v)) = pair.split_once('=') else {
                continue;
            };
            let k = k.trim();
            let v = v.trim();
            if k.is_empty() {
                continue;
            }
            options.insert(k.to_string(), v.to_string());
        }
    }
    options
}

/// The utterance with any inline-option brackets stripped, for use as the
/// human-readable description/content.
pub fn strip_inline_options(text: &str) -> String {
    BRACKET_BLOCK.replace_all(text, "").trim().to_string()
}
