//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Renders a star count as five filled/empty stars, e.g. `★★★☆☆`.
///
/// Values outside 0..=5 are clamped; non-numeric input renders as no stars.
///
/// Usage in templates: `{{ review.stars|stars }}`
#[askama::filter_fn]
pub fn stars(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(render_stars(&value.to_string()))
}

fn render_stars(value: &str) -> String {
    let filled = value.trim().parse::<i64>().unwrap_or(0).clamp(0, 5);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=5
    let filled = filled as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}
