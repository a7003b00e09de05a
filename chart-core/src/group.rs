//! Calendar-day bucketing of time-stamped records.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Key used for records without a usable date.
///
/// Sorts after every ISO day key in descending order.
pub const UNDATED_KEY: &str = "";

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Date-times without an offset, tried after RFC 3339.
const NAIVE_DATETIME_FORMATS: [&str; 3] =
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Records sharing one day key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DateGroup<T> {
    pub key: String,
    pub items: Vec<T>,
}

/// One group per distinct key, keys in first-seen order, items in input order.
pub fn group_by_date<T, F>(records: &[T], key_fn: F) -> Vec<DateGroup<T>>
where
    T: Clone,
    F: Fn(&T) -> String,
{
    let mut groups: Vec<DateGroup<T>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = key_fn(record);
        match positions.get(&key) {
            Some(&index) => groups[index].items.push(record.clone()),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push(DateGroup {
                    key,
                    items: vec![record.clone()],
                });
            }
        }
    }

    groups
}

/// Most recent day first. Stable for equal keys.
pub fn sort_groups_descending<T>(groups: &mut [DateGroup<T>]) {
    groups.sort_by(|a, b| b.key.cmp(&a.key));
}

/// Parses RFC 3339 timestamps, naive date-times and plain dates.
///
/// Inputs without an offset are read as UTC; a plain date is its midnight.
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, DAY_KEY_FORMAT)
                .ok()
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        })?;
    Some(FixedOffset::east_opt(0)?.from_utc_datetime(&naive))
}

/// Calendar day of a timestamp, in the timestamp's own offset.
pub fn parse_day(value: &str) -> Option<NaiveDate> {
    parse_timestamp(value).map(|dt| dt.date_naive())
}

/// ISO `YYYY-MM-DD` key for a date string, if it can be parsed.
pub fn day_key(value: &str) -> Option<String> {
    parse_day(value).map(|day| day.format(DAY_KEY_FORMAT).to_string())
}

/// Like [`day_key`], falling back to [`UNDATED_KEY`].
pub fn day_key_or_undated(value: Option<&str>) -> String {
    value
        .and_then(day_key)
        .unwrap_or_else(|| UNDATED_KEY.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_keep_first_seen_and_input_order() {
        let records = vec![
            ("a", "2024-03-01"),
            ("b", "2024-03-02"),
            ("c", "2024-03-01"),
            ("d", "2024-03-02"),
        ];
        let groups = group_by_date(&records, |(_, day)| day.to_string());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "2024-03-01");
        assert_eq!(groups[0].items, vec![("a", "2024-03-01"), ("c", "2024-03-01")]);
        assert_eq!(groups[1].items, vec![("b", "2024-03-02"), ("d", "2024-03-02")]);
    }

    #[test]
    fn descending_sort_puts_undated_last() {
        let records = vec![
            ("old", Some("2024-01-05T08:00:00Z")),
            ("none", None),
            ("new", Some("2024-02-11")),
        ];
        let mut groups = group_by_date(&records, |(_, day)| day_key_or_undated(*day));
        sort_groups_descending(&mut groups);
        let keys: Vec<_> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-02-11", "2024-01-05", UNDATED_KEY]);
    }

    #[test]
    fn day_key_accepts_common_formats() {
        assert_eq!(day_key("2024-03-09T23:30:00+07:00").as_deref(), Some("2024-03-09"));
        assert_eq!(day_key("2024-03-09T10:15:00.000").as_deref(), Some("2024-03-09"));
        assert_eq!(day_key("2024-03-09 10:15:00").as_deref(), Some("2024-03-09"));
        assert_eq!(day_key("2024-03-09").as_deref(), Some("2024-03-09"));
        assert_eq!(day_key("yesterday"), None);
        assert_eq!(day_key("   "), None);
    }

    #[test]
    fn timestamps_keep_their_offset() {
        let local = parse_timestamp("2024-03-10T01:30:00+07:00").expect("rfc 3339");
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(
            local.naive_utc(),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(18, 30, 0).unwrap()
        );

        let naive = parse_timestamp("2024-03-10 01:30:00").expect("naive");
        assert_eq!(naive.naive_utc(), naive.naive_local());
        assert_eq!(
            parse_timestamp("2024-03-10").map(|dt| dt.naive_utc()),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_hms_opt(0, 0, 0)
        );
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn empty_and_single_inputs() {
        let empty: Vec<DateGroup<u8>> = group_by_date(&[], |_| String::new());
        assert!(empty.is_empty());

        let single = group_by_date(&[7u8], |_| "2024-01-01".to_string());
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].items, vec![7]);
    }
}
