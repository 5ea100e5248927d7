use serde::de::Error as _;
use serde::Deserialize;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime,
};

use crate::core::time::to_primitive_utc;

pub(crate) fn format_date(value: Date) -> String {
    value
        .format(&format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| value.to_string())
}

fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), &format_description!("[year]-[month]-[day]")).ok()
}

/// RFC 3339, or a zone-less `YYYY-MM-DDTHH:MM[:SS]` read as UTC.
fn parse_datetime_flexible(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(to_primitive_utc(value));
    }

    if let Ok(value) = PrimitiveDateTime::parse(
        raw,
        &format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(value);
    }
    if let Ok(value) =
        PrimitiveDateTime::parse(raw, &format_description!("[year]-[month]-[day]T[hour]:[minute]"))
    {
        return Some(value);
    }

    parse_date(raw).map(|date| date.midnight())
}

pub(crate) fn deserialize_option_date<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => {
            parse_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}"))).map(Some)
        }
        None => Ok(None),
    }
}

pub(crate) fn deserialize_option_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<PrimitiveDateTime>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_datetime_flexible(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid datetime: {raw}")))
            .map(Some),
        None => Ok(None),
    }
}
