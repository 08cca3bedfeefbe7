use time::{Date, OffsetDateTime};

/// Source of "today" for timestamps and commit messages.
pub trait Clock {
    fn today(&self) -> Date;
}

/// Wall clock, UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_utc().date()
    }
}

/// Always returns the same day. Used by tests and `--date` style overrides.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}

/// `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Month;

    #[test]
    fn formats_zero_padded() {
        let d = Date::from_calendar_date(2026, Month::March, 4).unwrap();
        assert_eq!(format_date(d), "2026-03-04");
    }

    #[test]
    fn fixed_clock_is_fixed() {
        let d = Date::from_calendar_date(2025, Month::December, 31).unwrap();
        let clock = FixedClock(d);
        assert_eq!(clock.today(), d);
        assert_eq!(format_date(clock.today()), "2025-12-31");
    }
}
