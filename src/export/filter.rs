//! Order query filters for the export.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;

use crate::store::Filter;

/// Days covered by a range with one or both bounds missing.
pub const DEFAULT_RANGE_DAYS: i64 = 30;

const STORE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("Invalid date format: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),
}

/// Trimmed export query parameters; empty means "not given".
#[derive(Debug, Clone, Default)]
pub struct ExportParams {
    pub order_id: String,
    pub from: String,
    pub to: String,
    pub payment_status: String,
    pub order_status: String,
}

fn parse_day(value: &str) -> Result<NaiveDate, FilterError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| FilterError::InvalidDate(value.to_string()))
}

fn end_of_day(day: NaiveDate) -> NaiveDateTime {
    day.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

/// Inclusive `created` bounds, in UTC.
///
/// Both bounds given: `from 00:00:00` to `to 23:59:59`. Only one given: the
/// other lies [`DEFAULT_RANGE_DAYS`] away from it. Neither: the last
/// [`DEFAULT_RANGE_DAYS`] days up to `now`.
pub fn resolve_date_range(
    from: &str,
    to: &str,
    now: DateTime<Utc>,
) -> Result<(NaiveDateTime, NaiveDateTime), FilterError> {
    let span = Duration::days(DEFAULT_RANGE_DAYS);

    match (from.is_empty(), to.is_empty()) {
        (true, true) => {
            let to = now.naive_utc();
            Ok((to - span, to))
        }
        (false, true) => {
            let from_day = parse_day(from)?;
            Ok((from_day.and_time(NaiveTime::MIN), end_of_day(from_day) + span))
        }
        (true, false) => {
            let to = end_of_day(parse_day(to)?);
            Ok((to - span, to))
        }
        (false, false) => {
            let from_day = parse_day(from)?;
            let to_day = parse_day(to)?;
            Ok((from_day.and_time(NaiveTime::MIN), end_of_day(to_day)))
        }
    }
}

/// Filter for the `orders` query. An order id selects that order alone and
/// every other parameter is ignored.
///
/// That includes `paymentStatus` and `orderStatus`: an order asked for by id
/// is exported even when its statuses would not match them. Callers that used
/// to narrow a single-order export by status get the order back regardless.
pub fn build_orders_filter(
    params: &ExportParams,
    now: DateTime<Utc>,
) -> Result<Filter, FilterError> {
    if !params.order_id.is_empty() {
        return Ok(Filter::eq("id", params.order_id.as_str()));
    }

    let (from, to) = resolve_date_range(&params.from, &params.to, now)?;
    let mut conditions = vec![
        Filter::gte("created", from.format(STORE_DATETIME_FORMAT).to_string()),
        Filter::lte("created", to.format(STORE_DATETIME_FORMAT).to_string()),
    ];
    if !params.payment_status.is_empty() {
        conditions.push(Filter::eq("payment_status", params.payment_status.as_str()));
    }
    if !params.order_status.is_empty() {
        conditions.push(Filter::eq("orderStatus", params.order_status.as_str()));
    }

    Ok(Filter::And(conditions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_order_id_short_circuits_everything() {
        let params = ExportParams {
            order_id: "abc123".to_string(),
            from: "not-a-date".to_string(),
            payment_status: "paid".to_string(),
            order_status: "complete".to_string(),
            ..Default::default()
        };
        let filter = build_orders_filter(&params, now()).unwrap();
        assert_eq!(filter.to_expression(), r#"id = "abc123""#);
    }

    #[test]
    fn test_both_bounds_cover_whole_days() {
        let params = ExportParams {
            from: "2024-01-01".to_string(),
            to: "2024-01-31".to_string(),
            payment_status: "paid".to_string(),
            ..Default::default()
        };
        let filter = build_orders_filter(&params, now()).unwrap();
        assert_eq!(
            filter.to_expression(),
            r#"created >= "2024-01-01 00:00:00" && created <= "2024-01-31 23:59:59" && payment_status = "paid""#
        );
    }

    #[test]
    fn test_no_bounds_is_last_thirty_days() {
        let (from, to) = resolve_date_range("", "", now()).unwrap();
        assert_eq!(to.to_string(), "2024-06-15 12:30:00");
        assert_eq!(from.to_string(), "2024-05-16 12:30:00");
    }

    #[test]
    fn test_single_bounds_span_thirty_days() {
        let (from, to) = resolve_date_range("2024-03-01", "", now()).unwrap();
        assert_eq!(from.to_string(), "2024-03-01 00:00:00");
        assert_eq!(to.to_string(), "2024-03-31 23:59:59");

        let (from, to) = resolve_date_range("", "2024-03-31", now()).unwrap();
        assert_eq!(from.to_string(), "2024-03-01 23:59:59");
        assert_eq!(to.to_string(), "2024-03-31 23:59:59");
    }

    #[test]
    fn test_malformed_date_is_rejected() {
        let err = resolve_date_range("01/03/2024", "", now()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid date format: 01/03/2024 (expected YYYY-MM-DD)"
        );
    }

    #[test]
    fn test_status_values_are_escaped() {
        let params = ExportParams {
            from: "2024-01-01".to_string(),
            to: "2024-01-01".to_string(),
            order_status: r#"on "hold""#.to_string(),
            ..Default::default()
        };
        let expression = build_orders_filter(&params, now()).unwrap().to_expression();
        assert!(expression.ends_with(r#"orderStatus = "on \"hold\"""#));
    }
}
