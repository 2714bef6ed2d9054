use chrono::{DateTime, Datelike, Duration, SecondsFormat, SubsecRound, Utc};

/// Current time at the precision the database stores.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Next `updated_at` value for a row last touched at `previous`.
///
/// Never returns a value `<= previous`, even when two updates land inside
/// the same microsecond or the wall clock stepped backwards.
pub fn next_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

pub fn encode(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}

/// Whether `encode` output for `ts` can be read back by `decode`. RFC 3339
/// only has four-digit years, so the UTC year must stay in `0..=9999`.
pub fn is_storable(ts: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&ts.year())
}
