/// One sample of the typing speed curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    /// Whole seconds since the passage appeared
    pub secs: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(secs: f64, wpm: f64) -> Self {
        Self { secs, wpm }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.secs, p.wpm)
    }
}

/// Highest speed in the series, 0 for an empty one
pub fn peak_wpm(series: &[TimeSeriesPoint]) -> f64 {
    series.iter().map(|p| p.wpm).fold(0.0, f64::max)
}
