//! Text normalization applied to extracted PDF text before classification.

/// Bullet and dot glyphs that PDF lecture slides scatter through their text.
const BULLET_GLYPHS: &[char] = &[
    '\u{2022}', // •
    '\u{25E6}', // ◦
    '\u{25AA}', // ▪
    '\u{FE0E}', // text presentation selector that trails ▪
    '\u{25CF}', // ●
    '\u{25CB}', // ○
];

const CURLY_QUOTES: &[char] = &['\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

const DASHES: &[char] = &['\u{2014}', '\u{2013}'];

/// Normalize extracted text.
///
/// Rules run in a fixed order:
/// 1. drop bullet glyphs
/// 2. curly quotes → `"`
/// 3. em/en dashes → `-`
/// 4. drop everything above U+007F
/// 5. collapse whitespace runs to one space
/// 6. trim
pub fn sanitize(text: &str) -> String {
    let ascii: String = text
        .chars()
        .filter(|c| !BULLET_GLYPHS.contains(c))
        .map(|c| if CURLY_QUOTES.contains(&c) { '"' } else { c })
        .map(|c| if DASHES.contains(&c) { '-' } else { c })
        .filter(char::is_ascii)
        .collect();

    collapse_whitespace(&ascii).trim().to_string()
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
            }
            in_run = true;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}
