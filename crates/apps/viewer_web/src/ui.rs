//! Text shown next to the input sliders.

/// Whole-number slider label. Non-integral input is printed as-is.
pub fn format_integer(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// One-decimal slider label.
///
/// Exact halves round away from zero, so `0.25` reads `0.3` the way a browser
/// `toFixed(1)` prints it. `{:.1}` alone would round them to even.
pub fn format_one_decimal(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    // A value halfway between two tenths is an odd multiple of 1/4.
    let quarters = value * 4.0;
    let value = if quarters.fract() == 0.0 && quarters % 2.0 != 0.0 {
        (value * 10.0).round() / 10.0
    } else {
        value
    };
    // -0.0 prints without a sign.
    format!("{:.1}", value + 0.0)
}
