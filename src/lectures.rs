//! Weekly lecture timetable and reminders.

use crate::consts::{messages, Lecture, LECTURES};
use crate::notify::NotificationScheduler;
use chrono::{Datelike, Days, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LectureError {
    #[error("No lecture number {0}")] UnknownLecture(usize),
    #[error("Unreadable time {0:?}")] BadTime(String),
}

fn time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // ص = morning, م = evening
    RE.get_or_init(|| Regex::new(r"^\s*(\d{1,2}):(\d{2})\s*(ص|م)?\s*$").expect("valid regex"))
}

/// Reads timetable times such as `3:50م` or `09:15`.
pub fn parse_time(raw: &str) -> Result<NaiveTime, LectureError> {
    let bad = || LectureError::BadTime(raw.to_string());
    let caps = time_regex().captures(raw).ok_or_else(bad)?;

    let mut hour: u32 = caps[1].parse().map_err(|_| bad())?;
    let minute: u32 = caps[2].parse().map_err(|_| bad())?;
    match caps.get(3).map(|m| m.as_str()) {
        Some("م") if hour < 12 => hour += 12,
        Some("ص") if hour == 12 => hour = 0,
        Some(_) if hour > 12 => return Err(bad()),
        _ => {}
    }
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(bad)
}

/// Time from `now` until the next `weekday` at `time`, always strictly in the future.
pub fn delay_until_next(now: NaiveDateTime, weekday: Weekday, time: NaiveTime) -> Duration {
    let ahead = (7 + weekday.num_days_from_monday() - now.weekday().num_days_from_monday()) % 7;
    let mut next = now.date().and_time(time) + Days::new(u64::from(ahead));
    if next <= now {
        next = next + Days::new(7);
    }
    (next - now).to_std().unwrap_or_default()
}

pub fn lectures() -> &'static [Lecture] {
    LECTURES
}

pub struct Timetable {
    notifier: Arc<NotificationScheduler>,
}

impl Timetable {
    pub fn new(notifier: Arc<NotificationScheduler>) -> Self {
        Self { notifier }
    }

    /// Arms a reminder for lecture `number` (1-based, as listed) at its next start.
    pub fn schedule_reminder(&self, recipient: i64, number: usize, now: NaiveDateTime) -> Result<(&'static Lecture, Duration), LectureError> {
        let lecture = number
            .checked_sub(1)
            .and_then(|i| LECTURES.get(i))
            .ok_or(LectureError::UnknownLecture(number))?;

        let delay = delay_until_next(now, lecture.weekday, parse_time(lecture.time)?);
        let body = format!("تذكير: عندك محاضرة {} الآن ({})", lecture.subject, lecture.time);
        self.notifier.schedule(recipient, messages::LECTURE_TITLE, &body, delay);
        Ok((lecture, delay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::tests::RecordingSink;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn parses_arabic_meridiem() {
        assert_eq!(parse_time("3:50م"), Ok(NaiveTime::from_hms_opt(15, 50, 0).unwrap()));
        assert_eq!(parse_time("6:50 م"), Ok(NaiveTime::from_hms_opt(18, 50, 0).unwrap()));
        assert_eq!(parse_time("12:10ص"), Ok(NaiveTime::from_hms_opt(0, 10, 0).unwrap()));
        assert_eq!(parse_time("12:10م"), Ok(NaiveTime::from_hms_opt(12, 10, 0).unwrap()));
        assert_eq!(parse_time("09:15"), Ok(NaiveTime::from_hms_opt(9, 15, 0).unwrap()));
    }

    #[test]
    fn rejects_bad_times() {
        assert!(parse_time("soon").is_err());
        assert!(parse_time("13:00م").is_err());
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("3:70م").is_err());
    }

    #[test]
    fn every_listed_lecture_time_parses() {
        assert_eq!(lectures().len(), 5);
        for lecture in lectures() {
            assert!(parse_time(lecture.time).is_ok(), "{}", lecture.time);
        }
    }

    #[test]
    fn next_occurrence_later_same_week() {
        // 2024-03-04 is a Monday
        let now = at(2024, 3, 4, 9, 0);
        let delay = delay_until_next(now, Weekday::Tue, NaiveTime::from_hms_opt(15, 50, 0).unwrap());
        assert_eq!(delay, Duration::from_secs((24 + 6) * 3600 + 50 * 60));
    }

    #[test]
    fn next_occurrence_later_today() {
        let now = at(2024, 3, 4, 15, 0);
        let delay = delay_until_next(now, Weekday::Mon, NaiveTime::from_hms_opt(15, 50, 0).unwrap());
        assert_eq!(delay, Duration::from_secs(50 * 60));
    }

    #[test]
    fn already_started_today_rolls_to_next_week() {
        let now = at(2024, 3, 4, 15, 50);
        let delay = delay_until_next(now, Weekday::Mon, NaiveTime::from_hms_opt(15, 50, 0).unwrap());
        assert_eq!(delay, Duration::from_secs(7 * 24 * 3600));
    }

    #[test]
    fn earlier_weekday_wraps_around() {
        // Wednesday evening -> next Monday afternoon
        let now = at(2024, 3, 6, 20, 0);
        let delay = delay_until_next(now, Weekday::Mon, NaiveTime::from_hms_opt(15, 50, 0).unwrap());
        assert_eq!(delay, Duration::from_secs((4 * 24 + 19) * 3600 + 50 * 60));
    }

    #[tokio::test]
    async fn schedule_reminder_uses_listed_lecture() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = NotificationScheduler::new(sink);
        let timetable = Timetable::new(notifier.clone());

        let (lecture, delay) = timetable.schedule_reminder(3, 3, at(2024, 3, 5, 18, 0)).unwrap();
        assert_eq!(lecture.subject, "التشريعات الاخلاقية");
        assert_eq!(delay, Duration::from_secs(50 * 60));
        assert_eq!(notifier.pending_count(3), 1);

        assert_eq!(timetable.schedule_reminder(3, 0, at(2024, 3, 5, 18, 0)).unwrap_err(), LectureError::UnknownLecture(0));
        assert_eq!(timetable.schedule_reminder(3, 6, at(2024, 3, 5, 18, 0)).unwrap_err(), LectureError::UnknownLecture(6));
        notifier.cancel_all(3);
    }
}
