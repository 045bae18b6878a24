use chrono::{DateTime, Duration, Months, Utc};

/// Timestamps of the next `horizon` periods, following the cadence of `history`.
///
/// A median spacing of 28-31 days is treated as calendar months so month-end dates
/// do not drift; anything else repeats the median spacing. Histories with fewer than
/// two points are assumed monthly.
pub(crate) fn future_timestamps(history: &[DateTime<Utc>], horizon: usize) -> Vec<DateTime<Utc>> {
    let Some(&last) = history.last() else {
        return Vec::new();
    };

    let mut gaps: Vec<i64> = history
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds())
        .collect();
    gaps.sort_unstable();
    let median_gap = gaps.get(gaps.len() / 2).copied();

    let monthly = match median_gap {
        None => true,
        Some(secs) => (28 * 86_400..=31 * 86_400).contains(&secs),
    };

    (1..=horizon)
        .map(|h| {
            let step = median_gap.unwrap_or(30 * 86_400) * h as i64;
            let by_duration = last + Duration::seconds(step);
            if monthly {
                last.checked_add_months(Months::new(h as u32)).unwrap_or(by_duration)
            } else {
                by_duration
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn monthly_history_steps_by_calendar_month() {
        let history: Vec<_> = (1..=4)
            .map(|m| Utc.with_ymd_and_hms(2024, m, 1, 0, 0, 0).unwrap())
            .collect();
        let future = future_timestamps(&history, 2);
        assert_eq!(future.len(), 2);
        assert_eq!(future[0], history[3].checked_add_months(Months::new(1)).unwrap());
    }

    #[test]
    fn weekly_history_steps_by_seven_days() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let history: Vec<_> = (0..5).map(|w| start + Duration::weeks(w)).collect();
        let future = future_timestamps(&history, 3);
        assert_eq!(future[2], history[4] + Duration::weeks(3));
    }
}
