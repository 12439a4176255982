//! Post-processing: deterministic clean-up of engine-extracted run text.
//!
//! PDF text layers carry artefacts that render badly or break copy/paste
//! in a browser: presentation-form ligatures, zero-width joiners left over
//! from hyphenation, non-breaking spaces used as layout filler. Each rule
//! below is a pure `&str → String` pass, applied in order by
//! [`clean_text`].
//!
//! ## Rule Order
//!
//! Invisible characters go first so they cannot split a ligature or a
//! whitespace run; whitespace is collapsed last because the earlier rules
//! can leave doubled spaces behind.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to one run of text.
///
/// 1. Strip invisible Unicode (zero-width spaces/joiners, BOM, soft hyphen, word joiner)
/// 2. Expand Latin presentation-form ligatures (ﬁ → fi, …)
/// 3. Replace non-breaking and other fixed-width spaces with a plain space
/// 4. Collapse whitespace runs to one space and trim
pub fn clean_text(input: &str) -> String {
    let s = remove_invisible_chars(input);
    let s = expand_ligatures(&s);
    let s = normalise_spaces(&s);
    collapse_whitespace(&s)
}

// ── Rule 1: Strip invisible characters ───────────────────────────────────────

static RE_INVISIBLE: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{200B}\u{200C}\u{200D}\u{2060}\u{FEFF}\u{00AD}]").unwrap());

fn remove_invisible_chars(input: &str) -> String {
    RE_INVISIBLE.replace_all(input, "").into_owned()
}

// ── Rule 2: Expand ligatures ─────────────────────────────────────────────────

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

fn expand_ligatures(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match LIGATURES.iter().find(|(lig, _)| *lig == ch) {
            Some((_, expansion)) => out.push_str(expansion),
            None => out.push(ch),
        }
    }
    out
}

// ── Rule 3: Normalise fixed-width spaces ─────────────────────────────────────

static RE_FIXED_SPACES: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{00A0}\u{2000}-\u{200A}\u{202F}\u{205F}\u{3000}]").unwrap());

fn normalise_spaces(input: &str) -> String {
    RE_FIXED_SPACES.replace_all(input, " ").into_owned()
}

// ── Rule 4: Collapse whitespace ──────────────────────────────────────────────

static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse_whitespace(input: &str) -> String {
    RE_WHITESPACE.replace_all(input.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_invisible() {
        assert_eq!(remove_invisible_chars("a\u{200B}b\u{FEFF}c\u{00AD}d"), "abcd");
    }

    #[test]
    fn expands_ligatures() {
        assert_eq!(expand_ligatures("\u{FB01}nal \u{FB03}ce"), "final office");
    }

    #[test]
    fn normalises_nbsp() {
        assert_eq!(normalise_spaces("a\u{00A0}b\u{2009}c"), "a b c");
    }

    #[test]
    fn collapses_whitespace() {
        assert_eq!(collapse_whitespace("  a \t\n b  "), "a b");
    }

    #[test]
    fn full_pipeline() {
        assert_eq!(
            clean_text(" e\u{FB00}ect\u{00A0}\u{00A0}of\u{200B} wa\u{FB04}e "),
            "effect of waffle"
        );
    }

    #[test]
    fn plain_text_untouched() {
        assert_eq!(clean_text("Hello, world!"), "Hello, world!");
    }
}
