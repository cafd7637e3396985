const INVISIBLE: [char; 5] = ['\u{feff}', '\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}'];

/// Comparison key for county names: invisible characters removed, whitespace collapsed,
/// lower-cased.
pub(crate) fn normalize_county(value: &str) -> String {
    let cleaned = value.replace(INVISIBLE, "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

pub(crate) fn normalize_state(value: &str) -> String {
    value.replace(INVISIBLE, "").trim().to_ascii_uppercase()
}
