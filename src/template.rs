//! Minimal format-string expansion against one track's tags.
//!
//! Supported codes:
//! - `%{field}`: any tag by name (case-insensitive)
//! - `%a` artist, `%l` album, `%s` title, `%t` track, `%y` year, `%g` genre, `%c` comment
//! - `%%`: a literal percent sign
//! - `%{max-field}`, `%{min-field}`, `%{unq-field}`: aggregate codes. They stay
//!   in the text as placeholders; the field value is reported alongside.
//!
//! Separators inside tag values are replaced, and values of `.` or `..`
//! become dashes, so a value can never add or climb directory levels on its own.

use std::collections::BTreeMap;

use crate::rename::{placeholder, AggregateKind, Expansion};

/// Tag name -> value, names lower-case.
pub type Tags = BTreeMap<String, String>;

fn short_code(c: char) -> Option<&'static str> {
    Some(match c {
        'a' => "artist",
        'l' => "album",
        's' => "title",
        't' => "track",
        'y' => "year",
        'g' => "genre",
        'c' => "comment",
        _ => return None,
    })
}

fn sanitize(value: &str) -> String {
    let value = value.trim().replace(['/', '\\'], "-");
    // "." and ".." would name the current or parent directory
    if value == "." || value == ".." {
        return "-".repeat(value.len());
    }
    value
}

fn lookup<'t>(tags: &'t Tags, field: &str) -> Option<&'t str> {
    tags.get(&field.to_ascii_lowercase())
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
}

/// Expand `template` with `tags`.
///
/// Returns `None` when the template references fields but none of them has a
/// value, so the caller can skip the file.
pub fn expand(template: &str, tags: &Tags) -> Option<Expansion> {
    let mut out = Expansion::default();
    let mut referenced = 0usize;
    let mut found = 0usize;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.text.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.text.push('%');
            }
            Some('{') => {
                let rest: String = chars.clone().skip(1).collect();
                let Some(end) = rest.find('}') else {
                    out.text.push('%');
                    continue;
                };
                let code = rest[..end].trim().to_string();
                // consume '{', the code and '}'
                for _ in 0..rest[..end].chars().count() + 2 {
                    chars.next();
                }
                referenced += 1;
                if let Some((_, base)) = AggregateKind::parse(&code) {
                    let value = lookup(tags, base).map(sanitize).unwrap_or_default();
                    if !value.is_empty() {
                        found += 1;
                    }
                    out.text.push_str(&placeholder(&code));
                    out.aggregates.push((code, value));
                } else if let Some(value) = lookup(tags, &code) {
                    found += 1;
                    out.text.push_str(&sanitize(value));
                }
            }
            Some(letter) => match short_code(letter) {
                Some(field) => {
                    chars.next();
                    referenced += 1;
                    if let Some(value) = lookup(tags, field) {
                        found += 1;
                        out.text.push_str(&sanitize(value));
                    }
                }
                None => out.text.push('%'),
            },
            None => out.text.push('%'),
        }
    }

    if referenced > 0 && found == 0 {
        return None;
    }
    Some(out)
}
