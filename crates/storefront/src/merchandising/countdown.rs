//! "Free gift of the hour" countdown.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Hours, minutes and seconds left on a promotional countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Countdown {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Countdown {
    /// Split a number of seconds into hours, minutes and seconds.
    #[must_use]
    pub const fn from_secs(total: u64) -> Self {
        let hours = total / 3600;
        Self {
            hours: if hours > u32::MAX as u64 {
                u32::MAX
            } else {
                hours as u32
            },
            minutes: ((total % 3600) / 60) as u32,
            seconds: (total % 60) as u32,
        }
    }

    /// Time left until `deadline`, zero once it has passed.
    #[must_use]
    pub fn until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining = (deadline - now).num_seconds().max(0);
        Self::from_secs(u64::try_from(remaining).unwrap_or_default())
    }

    /// Total seconds remaining.
    #[must_use]
    pub const fn total_secs(&self) -> u64 {
        self.hours as u64 * 3600 + self.minutes as u64 * 60 + self.seconds as u64
    }

    /// Whether the countdown has reached zero.
    #[must_use]
    pub const fn is_expired(&self) -> bool {
        self.hours == 0 && self.minutes == 0 && self.seconds == 0
    }

    /// Advance one second. Stays at zero once expired.
    pub const fn tick(&mut self) {
        if self.seconds > 0 {
            self.seconds -= 1;
        } else if self.minutes > 0 {
            self.minutes -= 1;
            self.seconds = 59;
        } else if self.hours > 0 {
            self.hours -= 1;
            self.minutes = 59;
            self.seconds = 59;
        }
    }
}

impl From<Duration> for Countdown {
    fn from(duration: Duration) -> Self {
        Self::from_secs(duration.as_secs())
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_promo_length() {
        let countdown = Countdown::from(Duration::from_secs(692));
        assert_eq!(
            countdown,
            Countdown {
                hours: 0,
                minutes: 11,
                seconds: 32
            }
        );
        assert_eq!(countdown.to_string(), "00:11:32");
        assert_eq!(countdown.total_secs(), 692);
    }

    #[test]
    fn test_tick_borrows_from_minutes_then_hours() {
        let mut countdown = Countdown {
            hours: 1,
            minutes: 0,
            seconds: 0,
        };
        countdown.tick();
        assert_eq!(countdown.to_string(), "00:59:59");

        let mut countdown = Countdown {
            hours: 0,
            minutes: 2,
            seconds: 0,
        };
        countdown.tick();
        assert_eq!(countdown.to_string(), "00:01:59");
    }

    #[test]
    fn test_tick_stops_at_zero() {
        let mut countdown = Countdown::from_secs(1);
        countdown.tick();
        assert!(countdown.is_expired());
        countdown.tick();
        assert!(countdown.is_expired());
        assert_eq!(countdown.to_string(), "00:00:00");
    }

    #[test]
    fn test_until_deadline() {
        let now = Utc::now();
        let deadline = now + chrono::Duration::seconds(3725);
        assert_eq!(Countdown::until(deadline, now).to_string(), "01:02:05");
        assert!(Countdown::until(now, deadline).is_expired());
    }
}
