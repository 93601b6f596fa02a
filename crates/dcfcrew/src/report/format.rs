//! Number formatting for report text.

pub const NOT_AVAILABLE: &str = "N/A";

/// Formats `value` with a fixed number of decimals and optional thousands
/// separators. Missing values render as `N/A`.
pub fn fmt_num(value: Option<f64>, decimals: usize, grouped: bool) -> String {
    match value {
        Some(v) if v.is_finite() => format_finite(v, decimals, grouped),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// `12.5` → `12.50%`, missing → `N/A%`.
pub fn fmt_pct(value: Option<f64>, decimals: usize) -> String {
    format!("{}%", fmt_num(value, decimals, false))
}

/// `1234.5` → `$1,234.50`, missing → `$N/A`.
pub fn fmt_dollars(value: Option<f64>) -> String {
    format!("${}", fmt_num(value, 2, true))
}

fn format_finite(value: f64, decimals: usize, grouped: bool) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let is_zero = formatted.chars().all(|c| c == '0' || c == '.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };

    if !grouped {
        return format!("{}{}", sign, formatted);
    }

    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (formatted.as_str(), None),
    };

    let mut grouped_int = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped_int.push(',');
        }
        grouped_int.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped_int, frac),
        None => format!("{}{}", sign, grouped_int),
    }
}
