//! HTML entity decoding and escaping.

use std::borrow::Cow;
use std::collections::HashMap;

lazy_static::lazy_static! {
    static ref ENTITIES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        // Markup-significant
        m.insert("lt", "<");
        m.insert("gt", ">");
        m.insert("amp", "&");
        m.insert("quot", "\"");
        m.insert("apos", "'");
        // Common named entities
        m.insert("nbsp", "\u{00A0}");
        m.insert("copy", "\u{00A9}");
        m.insert("reg", "\u{00AE}");
        m.insert("trade", "\u{2122}");
        m.insert("hellip", "\u{2026}");
        m.insert("mdash", "\u{2014}");
        m.insert("ndash", "\u{2013}");
        m.insert("ldquo", "\u{201C}");
        m.insert("rdquo", "\u{201D}");
        m.insert("lsquo", "\u{2018}");
        m.insert("rsquo", "\u{2019}");
        m.insert("laquo", "\u{00AB}");
        m.insert("raquo", "\u{00BB}");
        m.insert("bull", "\u{2022}");
        m.insert("middot", "\u{00B7}");
        m.insert("times", "\u{00D7}");
        m.insert("divide", "\u{00F7}");
        m.insert("euro", "\u{20AC}");
        m.insert("pound", "\u{00A3}");
        m.insert("yen", "\u{00A5}");
        m.insert("cent", "\u{00A2}");
        m.insert("deg", "\u{00B0}");
        m.insert("plusmn", "\u{00B1}");
        m.insert("micro", "\u{00B5}");
        m.insert("para", "\u{00B6}");
        m.insert("sect", "\u{00A7}");
        m.insert("frac14", "\u{00BC}");
        m.insert("frac12", "\u{00BD}");
        m.insert("frac34", "\u{00BE}");
        m.insert("larr", "\u{2190}");
        m.insert("rarr", "\u{2192}");
        m.insert("uarr", "\u{2191}");
        m.insert("darr", "\u{2193}");
        m
    };
}

/// Decode named and numeric character references.
///
/// Unknown or unterminated references are kept verbatim.
pub fn decode(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '&' {
            result.push(ch);
            continue;
        }

        let mut entity = String::new();
        let mut found_end = false;

        while let Some(&next_ch) = chars.peek() {
            if next_ch == ';' {
                chars.next();
                found_end = true;
                break;
            } else if next_ch.is_alphanumeric() || next_ch == '#' {
                entity.push(next_ch);
                chars.next();
            } else {
                break;
            }

            // Limit entity length
            if entity.len() > 32 {
                break;
            }
        }

        if found_end && !entity.is_empty() {
            let decoded = match entity.strip_prefix('#') {
                Some(numeric) => decode_numeric(numeric),
                None => ENTITIES.get(entity.as_str()).map(|s| s.to_string()),
            };
            if let Some(decoded) = decoded {
                result.push_str(&decoded);
                continue;
            }
        }

        result.push('&');
        result.push_str(&entity);
        if found_end {
            result.push(';');
        }
    }

    result
}

fn decode_numeric(num_str: &str) -> Option<String> {
    let (radix, digits) = match num_str.strip_prefix(['x', 'X']) {
        Some(hex) => (16, hex),
        None => (10, num_str),
    };

    let code_point = u32::from_str_radix(digits, radix).ok()?;
    char::from_u32(code_point).map(|c| c.to_string())
}

/// Escape `&`, `<`, `>`, `"` and `'`.
pub fn escape(input: &str) -> Cow<'_, str> {
    if !input.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(input);
    }
    let mut result = String::with_capacity(input.len() + 16);
    for ch in input.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#039;"),
            _ => result.push(ch),
        }
    }
    Cow::Owned(result)
}
