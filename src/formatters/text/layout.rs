//! Time layouts for the `{{time}}` element
//!
//! Besides the `date`/`time` keywords, a property may spell out a layout by
//! example using the reference time `Mon Jan 2 15:04:05 MST 2006`. Such
//! layouts are translated to strftime once, when the header is compiled.

use chrono::format::{Item, StrftimeItems};

/// Default layout: date, time and microseconds.
pub const DEFAULT_LAYOUT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const DATE_LAYOUT: &str = "%Y-%m-%d";
const TIME_LAYOUT: &str = "%H:%M:%S";

/// strftime layout for a `{{time:...}}` property.
pub fn strftime_for(property: &str) -> String {
    if property.chars().any(|c| c.is_ascii_digit()) {
        return translate_reference(property);
    }

    let lower = property.to_lowercase();
    let mut fields = lower.split('.');
    let mut layout = match fields.next().unwrap_or("") {
        "date" => format!("{} {}", DATE_LAYOUT, TIME_LAYOUT),
        "time" => TIME_LAYOUT.to_string(),
        _ => return DEFAULT_LAYOUT.to_string(),
    };
    match fields.next() {
        Some("ms") => layout.push_str("%.3f"),
        Some("us") => layout.push_str("%.6f"),
        Some("ns") => layout.push_str("%.9f"),
        _ => {}
    }
    layout
}

/// Precompiled chrono items for a property, falling back to the default
/// layout when the translated layout is rejected.
pub fn compile(property: &str) -> Vec<Item<'static>> {
    let layout = strftime_for(property);
    StrftimeItems::new(&layout)
        .parse_to_owned()
        .or_else(|_| StrftimeItems::new(DEFAULT_LAYOUT).parse_to_owned())
        .unwrap_or_default()
}

// Longest tokens first wherever one is a prefix of another.
const REFERENCE_TOKENS: &[(&str, &str)] = &[
    ("January", "%B"),
    ("Jan", "%b"),
    ("Monday", "%A"),
    ("Mon", "%a"),
    ("MST", "%Z"),
    ("2006", "%Y"),
    ("-07:00:00", "%::z"),
    ("-07:00", "%:z"),
    ("-0700", "%z"),
    ("-07", "%:::z"),
    ("Z07:00", "%:z"),
    ("Z0700", "%z"),
    ("Z07", "%:::z"),
    ("002", "%j"),
    ("_2", "%e"),
    ("01", "%m"),
    ("02", "%d"),
    ("03", "%I"),
    ("04", "%M"),
    ("05", "%S"),
    ("06", "%y"),
    ("15", "%H"),
    ("PM", "%p"),
    ("pm", "%P"),
    ("1", "%-m"),
    ("2", "%-d"),
    ("3", "%-I"),
    ("4", "%-M"),
    ("5", "%-S"),
];

/// Translate a reference-time layout such as `"2006-01-02 15:04:05.000"` to
/// strftime. Unrecognized text is kept literally.
pub fn translate_reference(layout: &str) -> String {
    let mut out = String::with_capacity(layout.len() * 2);
    let mut rest = layout;
    'scan: while let Some(c) = rest.chars().next() {
        if let Some((spec, len)) = fraction(rest) {
            out.push_str(spec);
            rest = &rest[len..];
            continue;
        }
        for (token, spec) in REFERENCE_TOKENS {
            if rest.starts_with(token) {
                out.push_str(spec);
                rest = &rest[token.len()..];
                continue 'scan;
            }
        }
        if c == '%' {
            out.push_str("%%");
        } else {
            out.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// `.000`/`,000` style fractional seconds at the start of `s`. A run of zeros
/// pads to a fixed width, a run of nines trims trailing zeros.
fn fraction(s: &str) -> Option<(&'static str, usize)> {
    let bytes = s.as_bytes();
    if bytes.len() < 2 || (bytes[0] != b'.' && bytes[0] != b',') {
        return None;
    }
    let digit = bytes[1];
    if digit != b'0' && digit != b'9' {
        return None;
    }
    let run = bytes[1..].iter().take_while(|&&b| b == digit).count();
    if bytes.get(1 + run).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let spec = match (digit, run) {
        (b'9', _) => "%.f",
        (_, 1..=3) => "%.3f",
        (_, 4..=6) => "%.6f",
        _ => "%.9f",
    };
    Some((spec, 1 + run))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    #[test]
    fn test_keyword_layouts() {
        assert_eq!(strftime_for(""), DEFAULT_LAYOUT);
        assert_eq!(strftime_for("time"), "%H:%M:%S");
        assert_eq!(strftime_for("time.us"), "%H:%M:%S%.6f");
        assert_eq!(strftime_for("DATE.ms"), "%Y-%m-%d %H:%M:%S%.3f");
        assert_eq!(strftime_for("date"), "%Y-%m-%d %H:%M:%S");
        assert_eq!(strftime_for("bogus"), DEFAULT_LAYOUT);
    }

    #[test]
    fn test_reference_layouts() {
        assert_eq!(
            translate_reference("2006-01-02 15:04:05.000"),
            "%Y-%m-%d %H:%M:%S%.3f"
        );
        assert_eq!(translate_reference("02 Jan 06 15:04 -0700"), "%d %b %y %H:%M %z");
        assert_eq!(translate_reference("Monday 3PM"), "%A %-I%p");
        assert_eq!(translate_reference("100%"), "%-m00%%");
    }

    #[test]
    fn test_compiled_items_render() {
        let ts = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).single().unwrap();
        let items = compile("2006/01/02 15:04:05");
        assert_eq!(
            ts.format_with_items(items.iter()).to_string(),
            "2024/03/09 07:05:01"
        );
    }
}
