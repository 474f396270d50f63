//! Cell text cleanup: HTML entities, whitespace, and lenient number parsing.
//!
//! Source tables are scraped from markup, so numeric cells may carry
//! trailing annotations (`1215.67*`), entities (`&minus;`, `&times;`), or
//! scientific notation written as `1.2&times;10<sup>-3</sup>`.

use quick_xml::escape::{resolve_html5_entity, unescape_with};

/// Resolve `&name;` / `&#NNN;` / `&#xHH;` references against the HTML5
/// entity set. A cell with a bare `&` or an unknown entity is returned as
/// written.
pub fn decode_entities(s: &str) -> String {
    match unescape_with(s, resolve_html5_entity) {
        Ok(decoded) => decoded.into_owned(),
        Err(e) => {
            log::trace!("keeping {s:?} undecoded: {e}");
            s.to_string()
        }
    }
}

/// Trim and fold every whitespace run (including NBSP) into one space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Remove `<...>` tags, keeping their text content.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Length in bytes of the longest prefix of `s` that is a decimal float
/// (`[+-]? digits [. digits] [e[+-]digits]`), or 0.
fn float_prefix_len(s: &str) -> usize {
    let b = s.as_bytes();
    let mut i = 0;
    if i < b.len() && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let int_start = i;
    while i < b.len() && b[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;
    if i < b.len() && b[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        digits += j - frac_start;
        if digits > 0 {
            i = j;
        }
    }
    if digits == 0 {
        return 0;
    }
    if i < b.len() && (b[i] == b'e' || b[i] == b'E') {
        let mut j = i + 1;
        if j < b.len() && (b[j] == b'+' || b[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < b.len() && b[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    i
}

fn superscript_to_ascii(c: char) -> Option<char> {
    Some(match c {
        '⁰' => '0',
        '¹' => '1',
        '²' => '2',
        '³' => '3',
        '⁴' => '4',
        '⁵' => '5',
        '⁶' => '6',
        '⁷' => '7',
        '⁸' => '8',
        '⁹' => '9',
        '⁻' | '−' | '-' => '-',
        '⁺' | '+' => '+',
        c if c.is_ascii_digit() => c,
        _ => return None,
    })
}

/// Parse an exponent after a `×10` marker: optional `^`, then ASCII or
/// superscript digits with an optional sign.
fn parse_power_of_ten(s: &str) -> Option<i32> {
    let s = s.trim_start().trim_start_matches('^');
    let exp: String = s.chars().map_while(superscript_to_ascii).collect();
    exp.parse().ok()
}

/// Parse a numeric cell the way a lenient scraper would.
///
/// Entities and tags are removed first, the Unicode minus sign is accepted,
/// and only the leading number is read (`"1215.67*"` → `1215.67`). A
/// mantissa followed by `×10^n` / `x10<sup>n</sup>` is scaled accordingly.
/// Returns `None` for text without a leading number or for non-finite
/// results.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned = strip_tags(&decode_entities(cell)).replace('−', "-");
    let s = cleaned.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{a0}');

    let len = float_prefix_len(s);
    if len == 0 {
        return None;
    }
    let mut value: f64 = s[..len].parse().ok()?;

    let rest = s[len..].trim_start();
    let after_times = rest
        .strip_prefix('×')
        .or_else(|| rest.strip_prefix('x'))
        .or_else(|| rest.strip_prefix('*'));
    if let Some(after) = after_times.map(str::trim_start) {
        if let Some(exp) = after.strip_prefix("10").and_then(parse_power_of_ten) {
            value *= 10f64.powi(exp);
        }
    }

    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(decode_entities("H&alpha;"), "Hα");
        assert_eq!(decode_entities("Ly&#946;"), "Lyβ");
        assert_eq!(decode_entities("Ly&#x3b3;"), "Lyγ");
        assert_eq!(decode_entities("[O&nbsp;III]"), "[O\u{a0}III]");
        assert_eq!(decode_entities("[O&thinsp;III]"), "[O\u{2009}III]");
        assert_eq!(decode_entities("&lsqb;N II&rsqb;"), "[N II]");
    }

    #[test]
    fn decodes_exactly_one_level() {
        assert_eq!(decode_entities("see &amp;lt;ref&amp;gt;"), "see &lt;ref&gt;");
    }

    #[test]
    fn unknown_entities_are_kept() {
        assert_eq!(decode_entities("A & B"), "A & B");
        assert_eq!(decode_entities("&bogus; x"), "&bogus; x");
        assert_eq!(decode_entities("trailing &"), "trailing &");
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(collapse_whitespace("  [O \n  III]\t"), "[O III]");
        assert_eq!(collapse_whitespace("\u{a0}He\u{a0}II"), "He II");
        assert_eq!(collapse_whitespace("   "), "");
    }

    #[test]
    fn strips_tags() {
        assert_eq!(strip_tags("2p<sup>2</sup>"), "2p2");
    }

    #[test]
    fn parses_leading_number() {
        assert_eq!(parse_number("1215.67"), Some(1215.67));
        assert_eq!(parse_number(" 6562.80* "), Some(6562.80));
        assert_eq!(parse_number("13.6 eV"), Some(13.6));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("3.4e-2"), Some(0.034));
        assert_eq!(parse_number("2e"), Some(2.0));
        assert_eq!(parse_number("&minus;1.5"), Some(-1.5));
    }

    #[test]
    fn rejects_non_numbers() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("   "), None);
        assert_eq!(parse_number("—"), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("Infinity"), None);
        assert_eq!(parse_number("1e400"), None);
    }

    #[test]
    fn parses_entity_scientific_notation() {
        let v = parse_number("1.2&times;10<sup>-3</sup>").unwrap();
        assert!((v - 1.2e-3).abs() < 1e-15);
        let v = parse_number("4.5 × 10^4").unwrap();
        assert!((v - 4.5e4).abs() < 1e-9);
        let v = parse_number("3×10⁻²").unwrap();
        assert!((v - 0.03).abs() < 1e-15);
        let v = parse_number("7x10&minus;1").unwrap();
        assert!((v - 0.7).abs() < 1e-15);
    }
}
