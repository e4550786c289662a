// src/converter.rs
//
// Price-to-hours conversion. Deliberately coarse: results are bucketed to the
// nearest half hour, so no currency-exact arithmetic is needed.

/// Hours of work a price represents at the given wage.
///
/// Returns `None` for any invalid input (wage ≤ 0, negative price, non-finite
/// operand) — an invalid-input sentinel, not an error.
pub fn calculate_hours(price: f64, wage: f64) -> Option<f64> {
    if !price.is_finite() || !wage.is_finite() {
        return None;
    }
    if price < 0.0 || wage <= 0.0 {
        return None;
    }
    Some(price / wage)
}

/// Display string for an hours value, rounded to the nearest half hour.
///
/// `None`, NaN and negative values render as `"N/A"`; values below a quarter
/// hour render as `"< 0.5h"`.
pub fn format_hours(hours: Option<f64>) -> String {
    let Some(h) = hours else {
        return "N/A".to_string();
    };
    if !h.is_finite() || h < 0.0 {
        return "N/A".to_string();
    }
    if h < 0.25 {
        return "< 0.5h".to_string();
    }
    let rounded = (h * 2.0).round() / 2.0;
    if rounded.fract() == 0.0 {
        format!("{}h", rounded as u64)
    } else {
        format!("{}.5h", rounded.floor() as u64)
    }
}
