use chrono::NaiveDate;

/// Stem used when a company name has no usable characters.
const FALLBACK_STEM: &str = "company";

/// File-safe stem derived from a company name.
///
/// Keeps the part before the first hyphen, replaces every character outside
/// `[A-Za-z0-9_-]` with `_`, collapses runs of `_`, trims `_` from both ends
/// and lowercases the result.
pub fn company_stem(company_name: &str) -> String {
    let raw = match company_name.split_once('-') {
        Some((head, _)) => head.trim(),
        None => company_name,
    };

    let mut stem = String::with_capacity(raw.len());
    for ch in raw.chars() {
        let ch = if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            ch
        } else {
            '_'
        };
        if ch == '_' && stem.ends_with('_') {
            continue;
        }
        stem.push(ch.to_ascii_lowercase());
    }

    let stem = stem.trim_matches('_');
    if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem.to_string()
    }
}

/// `<stem>_valuation_<YYYYMMDD>.zip`
pub fn archive_filename(company_name: &str, date: NaiveDate) -> String {
    format!(
        "{}_valuation_{}.zip",
        company_stem(company_name),
        date.format("%Y%m%d")
    )
}
