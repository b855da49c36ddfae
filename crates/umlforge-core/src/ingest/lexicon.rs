//! Small word-level helpers shared by the rule-based extractor and the builder.

/// Capitalized function words that look like class names but never are.
pub const CAPITALIZED_STOPWORDS: &[&str] = &[
    "the", "this", "that", "these", "those", "each", "every", "all", "any", "some", "when",
    "where", "what", "which", "while", "who", "how", "why", "then", "there", "their", "they",
    "also", "and", "but", "for", "not", "only", "other", "our", "your", "its", "his", "her",
    "with", "from", "into", "after", "before", "if", "once", "both", "many", "most", "system",
];

/// Determiners and filler words never used as attribute or object names.
pub const FILLER_WORDS: &[&str] = &[
    "the", "a", "an", "all", "each", "every", "one", "some", "any", "set", "list", "group",
    "collection", "type", "kind", "part", "lot", "most", "many", "none", "their", "his", "her",
    "its", "our", "your", "my", "multiple", "several", "various", "other", "this", "that",
    "these", "those", "them", "it", "instead", "because", "terms",
];

/// Verbs that follow a modal without naming a behavior.
pub const AUXILIARY_VERBS: &[&str] = &[
    "be", "have", "also", "not", "only", "then", "still", "now", "easily", "always", "never",
    "do", "get", "need", "want", "able",
];

pub fn is_stopword(word: &str, list: &[&str]) -> bool {
    let lower = word.to_lowercase();
    list.iter().any(|w| *w == lower)
}

/// Splits an identifier or phrase into lowercase tokens on `_`, `-`,
/// whitespace, `.` and camelCase humps.
pub fn tokens(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in text.chars() {
        if ch == '_' || ch == '-' || ch == '.' || ch.is_whitespace() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Naive English singular: `categories` -> `category`, `boxes` -> `box`,
/// `orders` -> `order`. Words ending in `ss` are left alone.
pub fn singular(word: &str) -> String {
    let lower = word.to_lowercase();
    if lower.len() > 4 && lower.ends_with("ies") {
        return format!("{}y", &lower[..lower.len() - 3]);
    }
    for suffix in ["sses", "xes", "ches", "shes"] {
        if lower.ends_with(suffix) {
            return lower[..lower.len() - 2].to_string();
        }
    }
    if lower.len() > 3 && lower.ends_with('s') && !lower.ends_with("ss") {
        return lower[..lower.len() - 1].to_string();
    }
    lower
}

/// Uppercases the first character.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}
