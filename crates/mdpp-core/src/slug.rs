//! Alias slug generation for headings.
//!
//! Used by the `add-aliases` tooling: heading text becomes a URL-friendly
//! slug, made unique against the aliases already present in the document.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static BOLD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid"));
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid"));

/// Convert heading text to a slug: inline markup stripped, lowercased,
/// non-alphanumeric runs collapsed to single hyphens.
///
/// # Example
///
/// ```
/// use mdpp_core::slugify;
///
/// assert_eq!(slugify("Getting **Started** with `mdpp`!"), "getting-started-with-mdpp");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let text = BOLD.replace_all(text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = CODE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");

    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Make `base` unique against `existing` by appending `-2`, `-3`, ...
#[must_use]
pub fn make_unique_alias(base: &str, existing: &HashSet<String>) -> String {
    if !existing.contains(base) {
        return base.to_owned();
    }
    let mut counter = 2;
    loop {
        let candidate = format!("{base}-{counter}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
