use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid schedule spec '{spec}': {reason}")]
pub struct ScheduleParseError {
    pub spec: String,
    pub reason: String,
}

/// Recurrence for the scheduled backup-and-prune cycle.
///
/// Read once at lifecycle start; changing it requires restarting the
/// scheduler. Two grammars:
///
/// - `daily@HH:MM` — fire once a day at that wall-clock time, UTC.
/// - `every:<N><h|m|s>` — fire on a fixed interval, e.g. `every:6h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleSpec {
    Daily { hour: i8, minute: i8 },
    Every(Duration),
}

impl ScheduleSpec {
    /// The next fire instant strictly after `now`.
    pub fn next_fire(&self, now: Timestamp) -> Timestamp {
        match *self {
            ScheduleSpec::Every(interval) => {
                let interval = SignedDuration::try_from(interval)
                    .unwrap_or(SignedDuration::from_hours(24));
                now + interval
            }
            ScheduleSpec::Daily { hour, minute } => {
                let today = now.to_zoned(TimeZone::UTC).date();
                let at = |date: Date| -> Option<Timestamp> {
                    date.at(hour, minute, 0, 0)
                        .to_zoned(TimeZone::UTC)
                        .ok()
                        .map(|z| z.timestamp())
                };
                match at(today) {
                    Some(t) if t > now => t,
                    _ => today
                        .tomorrow()
                        .ok()
                        .and_then(at)
                        .unwrap_or(now + SignedDuration::from_hours(24)),
                }
            }
        }
    }
}

impl FromStr for ScheduleSpec {
    type Err = ScheduleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason: &str| ScheduleParseError {
            spec: s.to_string(),
            reason: reason.to_string(),
        };

        if let Some(time) = s.strip_prefix("daily@") {
            let (hour, minute) = time
                .split_once(':')
                .ok_or_else(|| err("expected daily@HH:MM"))?;
            let hour: i8 = hour.parse().map_err(|_| err("hour is not a number"))?;
            let minute: i8 = minute.parse().map_err(|_| err("minute is not a number"))?;
            if !(0..=23).contains(&hour) {
                return Err(err("hour must be 0-23"));
            }
            if !(0..=59).contains(&minute) {
                return Err(err("minute must be 0-59"));
            }
            return Ok(ScheduleSpec::Daily { hour, minute });
        }

        if let Some(interval) = s.strip_prefix("every:") {
            let mut chars = interval.chars();
            let unit = chars.next_back().ok_or_else(|| err("interval is empty"))?;
            let value: u64 = chars
                .as_str()
                .parse()
                .map_err(|_| err("interval is not a number"))?;
            if value == 0 {
                return Err(err("interval must be positive"));
            }
            let seconds = match unit {
                'h' => value * 3600,
                'm' => value * 60,
                's' => value,
                _ => return Err(err("interval unit must be h, m, or s")),
            };
            return Ok(ScheduleSpec::Every(Duration::from_secs(seconds)));
        }

        Err(err("expected daily@HH:MM or every:<N><h|m|s>"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_daily() {
        assert_eq!(
            "daily@03:00".parse::<ScheduleSpec>().unwrap(),
            ScheduleSpec::Daily { hour: 3, minute: 0 }
        );
        assert_eq!(
            "daily@23:59".parse::<ScheduleSpec>().unwrap(),
            ScheduleSpec::Daily {
                hour: 23,
                minute: 59
            }
        );
    }

    #[test]
    fn parses_intervals() {
        assert_eq!(
            "every:6h".parse::<ScheduleSpec>().unwrap(),
            ScheduleSpec::Every(Duration::from_secs(6 * 3600))
        );
        assert_eq!(
            "every:30m".parse::<ScheduleSpec>().unwrap(),
            ScheduleSpec::Every(Duration::from_secs(1800))
        );
        assert_eq!(
            "every:45s".parse::<ScheduleSpec>().unwrap(),
            ScheduleSpec::Every(Duration::from_secs(45))
        );
    }

    #[test]
    fn rejects_junk() {
        assert!("".parse::<ScheduleSpec>().is_err());
        assert!("hourly".parse::<ScheduleSpec>().is_err());
        assert!("daily@25:00".parse::<ScheduleSpec>().is_err());
        assert!("daily@03:60".parse::<ScheduleSpec>().is_err());
        assert!("daily@0300".parse::<ScheduleSpec>().is_err());
        assert!("every:0h".parse::<ScheduleSpec>().is_err());
        assert!("every:5d".parse::<ScheduleSpec>().is_err());
        assert!("every:h".parse::<ScheduleSpec>().is_err());
        assert!("0 3 * * *".parse::<ScheduleSpec>().is_err());
    }

    #[test]
    fn interval_next_fire_adds_the_interval() {
        let spec = ScheduleSpec::Every(Duration::from_secs(3600));
        let now: Timestamp = "2026-08-07T12:00:00Z".parse().unwrap();
        assert_eq!(
            spec.next_fire(now),
            "2026-08-07T13:00:00Z".parse::<Timestamp>().unwrap()
        );
    }

    #[test]
    fn daily_next_fire_later_today() {
        let spec = ScheduleSpec::Daily { hour: 15, minute: 30 };
        let now: Timestamp = "2026-08-07T12:00:00Z".parse().unwrap();
        assert_eq!(
            spec.next_fire(now),
            "2026-08-07T15:30:00Z".parse::<Timestamp>().unwrap()
        );
    }

    #[test]
    fn daily_next_fire_rolls_to_tomorrow() {
        let spec = ScheduleSpec::Daily { hour: 3, minute: 0 };
        let now: Timestamp = "2026-08-07T12:00:00Z".parse().unwrap();
        assert_eq!(
            spec.next_fire(now),
            "2026-08-08T03:00:00Z".parse::<Timestamp>().unwrap()
        );
    }

    #[test]
    fn daily_fire_is_strictly_after_now() {
        let spec = ScheduleSpec::Daily { hour: 3, minute: 0 };
        let now: Timestamp = "2026-08-07T03:00:00Z".parse().unwrap();
        assert_eq!(
            spec.next_fire(now),
            "2026-08-08T03:00:00Z".parse::<Timestamp>().unwrap()
        );
    }
}
