//! Name normalization, tokenization, and nickname expansion.
//!
//! Raw pick names arrive as free text ("McCaffrey, Christian", "J. Allen",
//! "CMC"); canonical scorer names come from the statistics collaborator in
//! a consistent "First Last" form. Everything here is pure string work
//! shared by the matching strategies and the hybrid scorer.

use std::fmt;

/// Token-level first-name variants: informal ↔ formal forms.
/// Lookup is linear; the table is small enough that a map buys nothing.
const FIRST_NAME_NICKNAMES: &[(&str, &str)] = &[
    ("chris", "christopher"),
    ("mike", "michael"),
    ("matt", "matthew"),
    ("dave", "david"),
    ("rob", "robert"),
    ("bob", "robert"),
    ("dan", "daniel"),
    ("andy", "andrew"),
    ("tony", "anthony"),
    ("joe", "joseph"),
    ("jim", "james"),
    ("tom", "thomas"),
    ("will", "william"),
    ("bill", "william"),
    ("tim", "timothy"),
    ("gabe", "gabriel"),
    ("jamo", "jameson"),
];

/// Whole-name aliases for players widely known by a handle.
const PLAYER_ALIASES: &[(&str, &str)] = &[
    ("cmc", "christian mccaffrey"),
    ("dhop", "deandre hopkins"),
    ("hollywood", "marquise brown"),
    ("megatron", "calvin johnson"),
    ("beast mode", "marshawn lynch"),
    ("scary terry", "terry mclaurin"),
    ("sun god", "amon-ra st brown"),
    ("arsb", "amon-ra st brown"),
];

/// Generational suffixes dropped during tokenization.
const SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "v"];

/// Normalize a name for comparison: lowercase, trim, strip periods and
/// commas, collapse internal whitespace.
pub fn normalize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_space = true;
    for ch in name.trim().chars() {
        match ch {
            '.' | ',' => {}
            c if c.is_whitespace() => {
                if !last_was_space {
                    out.push(' ');
                    last_was_space = true;
                }
            }
            c => {
                out.extend(c.to_lowercase());
                last_was_space = false;
            }
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Split a normalized name into tokens, dropping generational suffixes
/// as long as something else remains.
pub fn tokenize(normalized: &str) -> Vec<String> {
    let raw: Vec<&str> = normalized.split_whitespace().collect();
    let kept: Vec<String> = raw
        .iter()
        .filter(|t| !SUFFIXES.contains(*t))
        .map(|t| t.to_string())
        .collect();
    if kept.is_empty() {
        raw.iter().map(|t| t.to_string()).collect()
    } else {
        kept
    }
}

/// Look up the formal form of a nickname token, or vice versa.
fn nickname_counterpart(token: &str) -> Option<&'static str> {
    for (nick, formal) in FIRST_NAME_NICKNAMES {
        if token == *nick {
            return Some(formal);
        }
        if token == *formal {
            return Some(nick);
        }
    }
    None
}

/// Generate the nickname/alias variations of a normalized name,
/// the name itself included.
pub fn expand_variations(normalized: &str, tokens: &[String]) -> Vec<String> {
    let mut variations = vec![normalized.to_string()];

    // Whole-name aliases in both directions.
    for (alias, full) in PLAYER_ALIASES {
        if normalized == *alias {
            variations.push((*full).to_string());
        } else if normalized == *full {
            variations.push((*alias).to_string());
        }
    }

    // Token-level first-name variants.
    for (i, token) in tokens.iter().enumerate() {
        if let Some(counterpart) = nickname_counterpart(token) {
            let mut swapped: Vec<&str> = tokens.iter().map(String::as_str).collect();
            swapped[i] = counterpart;
            variations.push(swapped.join(" "));
        }
    }

    variations.dedup();
    variations
}

// ---------------------------------------------------------------------------
// NameForm
// ---------------------------------------------------------------------------

/// A name with its derived comparison forms, computed once per candidate
/// so strategies and the hybrid scorer never repeat string work.
#[derive(Debug, Clone)]
pub struct NameForm {
    pub raw: String,
    pub normalized: String,
    pub tokens: Vec<String>,
    pub variations: Vec<String>,
}

impl NameForm {
    pub fn new(raw: &str) -> Self {
        let normalized = normalize(raw);
        let tokens = tokenize(&normalized);
        let variations = expand_variations(&normalized, &tokens);
        NameForm {
            raw: raw.to_string(),
            normalized,
            tokens,
            variations,
        }
    }

    /// Whether any token is a single-letter initial ("j" from "J.").
    pub fn has_initial(&self) -> bool {
        self.tokens.iter().any(|t| t.chars().count() == 1)
    }
}

impl fmt::Display for NameForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
