use crate::time_series::{peak_wpm, TimeSeriesPoint};

/// Compute X (seconds) and Y (WPM) bounds for the typing chart
pub fn compute_chart_params(series: &[TimeSeriesPoint], time_limit_secs: Option<f64>) -> (f64, f64) {
    let duration = series
        .last()
        .map(|p| p.secs)
        .or(time_limit_secs)
        .unwrap_or(1.0)
        .max(1.0);

    (duration, peak_wpm(series).round())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
