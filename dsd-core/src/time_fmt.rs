//! Date/time formatting helpers, returning strings in the process
//! locale's UTC offset.

use chrono::{DateTime, Local};

pub fn date_yyyymmdd(ts: DateTime<Local>) -> String {
    ts.format("%Y%m%d").to_string()
}

pub fn date_dashed(ts: DateTime<Local>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

pub fn date_slashed(ts: DateTime<Local>) -> String {
    ts.format("%Y/%m/%d").to_string()
}

pub fn time_hhmmss(ts: DateTime<Local>) -> String {
    ts.format("%H%M%S").to_string()
}

pub fn time_colon(ts: DateTime<Local>) -> String {
    ts.format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 7, 26, 9, 5, 3).unwrap()
    }

    #[test]
    fn formats_match_expected_shapes() {
        let ts = sample();
        assert_eq!(date_yyyymmdd(ts), "20260726");
        assert_eq!(date_dashed(ts), "2026-07-26");
        assert_eq!(date_slashed(ts), "2026/07/26");
        assert_eq!(time_hhmmss(ts), "090503");
        assert_eq!(time_colon(ts), "09:05:03");
    }
}
