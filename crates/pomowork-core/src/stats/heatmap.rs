//! Year-long focus heatmap projection.
//!
//! The grid runs week by week from the Sunday on or before January 1st to
//! the Saturday on or after December 31st, so every column holds seven days.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use super::DailyStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Empty,
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn for_count(count: u32) -> Self {
        match count {
            0 => Intensity::Empty,
            1..=2 => Intensity::Low,
            3..=5 => Intensity::Medium,
            _ => Intensity::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub focus_count: u32,
    pub intensity: Intensity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatmapHalf {
    First,
    Second,
}

impl HeatmapHalf {
    /// The half containing `date`'s month (July onwards is the second half).
    pub fn containing(date: NaiveDate) -> Self {
        if date.month() > 6 {
            HeatmapHalf::Second
        } else {
            HeatmapHalf::First
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heatmap {
    pub year: i32,
    pub weeks: Vec<[HeatmapCell; 7]>,
}

impl Heatmap {
    /// `None` when the year, or the padding weeks around it, fall outside
    /// the representable date range.
    pub fn for_year(stats: &DailyStats, year: i32) -> Option<Self> {
        let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
        let dec31 = NaiveDate::from_ymd_opt(year, 12, 31)?;

        let lead = i64::from(jan1.weekday().num_days_from_sunday());
        let trail = 6 - i64::from(dec31.weekday().num_days_from_sunday());
        let start = jan1.checked_sub_signed(Duration::days(lead))?;
        let end = dec31.checked_add_signed(Duration::days(trail))?;

        // Every date in start..=end is representable from here on.
        let week_count = (end - start).num_days() / 7 + 1;
        let weeks = (0..week_count)
            .map(|w| {
                let sunday = start + Duration::days(w * 7);
                std::array::from_fn(|offset| {
                    let date = sunday + Duration::days(offset as i64);
                    let focus_count = stats
                        .entry_for(&date.format("%Y-%m-%d").to_string())
                        .focus_count;
                    HeatmapCell {
                        date,
                        focus_count,
                        intensity: Intensity::for_count(focus_count),
                    }
                })
            })
            .collect();

        Some(Self { year, weeks })
    }

    /// Weeks shown for one half of the year: the first half gets the
    /// larger share when the week count is odd.
    pub fn half(&self, half: HeatmapHalf) -> &[[HeatmapCell; 7]] {
        let split = self.weeks.len().div_ceil(2);
        match half {
            HeatmapHalf::First => &self.weeks[..split],
            HeatmapHalf::Second => &self.weeks[split..],
        }
    }

    pub fn total_focus(&self) -> u32 {
        self.weeks
            .iter()
            .flatten()
            .filter(|c| c.date.year() == self.year)
            .map(|c| c.focus_count)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::SessionKind;

    #[test]
    fn grid_starts_on_sunday_and_ends_on_saturday() {
        let map = Heatmap::for_year(&DailyStats::new(), 2024).unwrap();
        let first = map.weeks.first().unwrap()[0].date;
        let last = map.weeks.last().unwrap()[6].date;
        assert_eq!(first.weekday(), Weekday::Sun);
        assert_eq!(last.weekday(), Weekday::Sat);
        // 2024-01-01 is a Monday.
        assert_eq!(first, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert!(last >= NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn cells_carry_focus_counts_and_buckets() {
        let mut stats = DailyStats::new();
        for _ in 0..4 {
            stats = stats.with_completion("2024-03-05", SessionKind::Focus);
        }
        stats = stats.with_completion("2024-03-05", SessionKind::ShortBreak);
        let map = Heatmap::for_year(&stats, 2024).unwrap();
        let cell = map
            .weeks
            .iter()
            .flatten()
            .find(|c| c.date == NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
            .unwrap();
        assert_eq!(cell.focus_count, 4);
        assert_eq!(cell.intensity, Intensity::Medium);
        assert_eq!(map.total_focus(), 4);
    }

    #[test]
    fn halves_cover_every_week_once() {
        let map = Heatmap::for_year(&DailyStats::new(), 2025).unwrap();
        let first = map.half(HeatmapHalf::First).len();
        let second = map.half(HeatmapHalf::Second).len();
        assert_eq!(first + second, map.weeks.len());
        assert!(first >= second);
    }

    #[test]
    fn years_at_the_edge_of_the_calendar_do_not_panic() {
        let stats = DailyStats::new();
        let edges = [
            NaiveDate::MIN.year(),
            NaiveDate::MIN.year() + 1,
            NaiveDate::MAX.year() - 1,
            NaiveDate::MAX.year(),
        ];
        for year in edges {
            if let Some(map) = Heatmap::for_year(&stats, year) {
                assert_eq!(map.weeks[0][0].date.weekday(), Weekday::Sun);
                assert_eq!(map.weeks.last().unwrap()[6].date.weekday(), Weekday::Sat);
            }
        }
        assert!(Heatmap::for_year(&stats, i32::MAX).is_none());
    }

    #[test]
    fn intensity_thresholds() {
        assert_eq!(Intensity::for_count(0), Intensity::Empty);
        assert_eq!(Intensity::for_count(2), Intensity::Low);
        assert_eq!(Intensity::for_count(5), Intensity::Medium);
        assert_eq!(Intensity::for_count(6), Intensity::High);
    }

    #[test]
    fn half_follows_month() {
        let june = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let july = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        assert_eq!(HeatmapHalf::containing(june), HeatmapHalf::First);
        assert_eq!(HeatmapHalf::containing(july), HeatmapHalf::Second);
    }
}
