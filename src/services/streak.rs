use chrono::NaiveDate;
use serde::Serialize;

/// GET /api/journals/streak
#[derive(Debug, Serialize, PartialEq)]
pub struct Streak {
    pub current_streak: i32,
    pub last_entry: Option<NaiveDate>,
    pub today_logged: bool,
}

/// Count consecutive logged days ending at (or adjacent to) `today`.
///
/// `dates` are the user's entry dates, descending and distinct. A user who
/// has not logged yet today keeps credit for a run ending yesterday: the
/// walk re-anchors to yesterday once, before any day has been counted.
/// After the first counted day, any gap ends the streak.
pub fn compute_streak(dates: &[NaiveDate], today: NaiveDate) -> Streak {
    let Some(&latest) = dates.first() else {
        return Streak {
            current_streak: 0,
            last_entry: None,
            today_logged: false,
        };
    };

    let yesterday = today - chrono::Duration::days(1);
    let mut streak = 0;
    let mut expected = today;

    for &date in dates {
        if streak == 0 && expected == today && date == yesterday {
            // Grace window: nothing logged today, run starts yesterday.
            expected = yesterday;
        }
        if date == expected {
            streak += 1;
            expected -= chrono::Duration::days(1);
        } else if date < expected {
            break;
        }
    }

    Streak {
        current_streak: streak,
        last_entry: Some(latest),
        today_logged: latest == today,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn days_back(today: NaiveDate, offsets: &[i64]) -> Vec<NaiveDate> {
        offsets
            .iter()
            .map(|&n| today - chrono::Duration::days(n))
            .collect()
    }

    #[test]
    fn empty_history_has_no_streak() {
        let result = compute_streak(&[], day("2026-08-06"));
        assert_eq!(
            result,
            Streak {
                current_streak: 0,
                last_entry: None,
                today_logged: false,
            }
        );
    }

    #[test]
    fn unbroken_run_ending_today() {
        let today = day("2026-08-06");
        let result = compute_streak(&days_back(today, &[0, 1, 2]), today);
        assert_eq!(result.current_streak, 3);
        assert!(result.today_logged);
        assert_eq!(result.last_entry, Some(today));
    }

    #[test]
    fn run_ending_yesterday_keeps_credit() {
        let today = day("2026-08-06");
        let result = compute_streak(&days_back(today, &[1, 2, 3]), today);
        assert_eq!(result.current_streak, 3);
        assert!(!result.today_logged);
        assert_eq!(result.last_entry, Some(today - chrono::Duration::days(1)));
    }

    #[test]
    fn two_day_gap_breaks_streak() {
        let today = day("2026-08-06");
        let result = compute_streak(&days_back(today, &[2, 3]), today);
        assert_eq!(result.current_streak, 0);
        assert!(!result.today_logged);
        assert_eq!(result.last_entry, Some(today - chrono::Duration::days(2)));
    }

    #[test]
    fn single_entry_today() {
        let today = day("2026-08-06");
        let result = compute_streak(&[today], today);
        assert_eq!(result.current_streak, 1);
        assert!(result.today_logged);
    }

    #[test]
    fn single_entry_yesterday() {
        let today = day("2026-08-06");
        let result = compute_streak(&days_back(today, &[1]), today);
        assert_eq!(result.current_streak, 1);
        assert!(!result.today_logged);
    }

    #[test]
    fn gap_after_counted_days_gets_no_grace() {
        let today = day("2026-08-06");
        // today, yesterday, then a hole at today-2
        let result = compute_streak(&days_back(today, &[0, 1, 3, 4]), today);
        assert_eq!(result.current_streak, 2);
        assert!(result.today_logged);
    }

    #[test]
    fn grace_run_stops_at_first_gap() {
        let today = day("2026-08-06");
        let result = compute_streak(&days_back(today, &[1, 3]), today);
        assert_eq!(result.current_streak, 1);
        assert!(!result.today_logged);
    }

    #[test]
    fn old_history_beyond_gap_is_ignored() {
        let today = day("2026-08-06");
        let result = compute_streak(&days_back(today, &[0, 1, 2, 10, 11, 12]), today);
        assert_eq!(result.current_streak, 3);
    }
}
