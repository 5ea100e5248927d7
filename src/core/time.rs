use time::{
    format_description::well_known::Rfc3339, Date, Duration, OffsetDateTime, PrimitiveDateTime,
    UtcOffset,
};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn today_utc() -> Date {
    OffsetDateTime::now_utc().date()
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Calendar date `days` after the timestamp, used for mentor support windows.
pub(crate) fn date_after_days(value: PrimitiveDateTime, days: i64) -> Date {
    value.date().checked_add(Duration::days(days)).unwrap_or(value.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Month, Time};

    fn at(year: i32, month: Month, day: u8) -> PrimitiveDateTime {
        let date = Date::from_calendar_date(year, month, day).unwrap();
        PrimitiveDateTime::new(date, Time::from_hms(10, 20, 30).unwrap())
    }

    #[test]
    fn format_primitive_outputs_utc_z() {
        assert_eq!(format_primitive(at(2025, Month::January, 2)), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn to_primitive_utc_drops_offset() {
        let shifted = at(2025, Month::January, 2)
            .assume_utc()
            .to_offset(UtcOffset::from_hms(5, 0, 0).unwrap());
        assert_eq!(to_primitive_utc(shifted), at(2025, Month::January, 2));
    }

    #[test]
    fn date_after_days_crosses_month_boundary() {
        let expected = Date::from_calendar_date(2025, Month::March, 1).unwrap();
        assert_eq!(date_after_days(at(2025, Month::January, 15), 45), expected);
    }
}
