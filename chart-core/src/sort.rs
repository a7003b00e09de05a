//! Stable rank-based sorting.
//!
//! Composite orderings are built by running several stable passes one after
//! the other instead of writing one multi-field comparator: the pass applied
//! last is the dominant key, earlier passes only break its ties.

use chrono::NaiveDate;
use tracing::trace;

use crate::group::parse_day;
use crate::rank::PriorityOrder;
use crate::records::OrderRecord;
use crate::ChartConfig;

/// Extracts the ranked field of a record.
pub type RankKey<T> = fn(&T) -> Option<&str>;

/// One stable pass of [`sort_by_ranks`].
pub struct RankPass<'a, T> {
    pub order: &'a PriorityOrder,
    pub key: RankKey<T>,
}

impl<'a, T> RankPass<'a, T> {
    pub fn new(order: &'a PriorityOrder, key: RankKey<T>) -> Self {
        Self { order, key }
    }
}

impl<T> Clone for RankPass<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RankPass<'_, T> {}

/// Ascending by rank of `key`, keeping input order for equal ranks.
pub fn sort_by_rank<T, F>(records: &[T], order: &PriorityOrder, key: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<&str>,
{
    let mut sorted = records.to_vec();
    rank_in_place(&mut sorted, order, key);
    sorted
}

fn rank_in_place<T, F>(records: &mut [T], order: &PriorityOrder, key: F)
where
    F: Fn(&T) -> Option<&str>,
{
    // `sort_by_key` is a stable sort.
    records.sort_by_key(|record| order.rank_opt(key(record)));
}

/// Applies every pass in sequence; `passes.last()` is the primary key.
pub fn sort_by_ranks<T: Clone>(records: &[T], passes: &[RankPass<'_, T>]) -> Vec<T> {
    let mut sorted = records.to_vec();
    for pass in passes {
        rank_in_place(&mut sorted, pass.order, pass.key);
    }
    trace!(records = sorted.len(), passes = passes.len(), "multi-pass rank sort");
    sorted
}

/// Groups by lifecycle status, ordered by clinical priority within a status.
pub fn sort_by_priority_then_status<T>(records: &[T], config: &ChartConfig) -> Vec<T>
where
    T: OrderRecord + Clone,
{
    sort_by_ranks(
        records,
        &[
            RankPass::new(&config.priority_order, T::priority),
            RankPass::new(&config.status_order, T::status),
        ],
    )
}

/// Today first, then ±1 day, then ±2 days and so on. Undated records go last.
pub fn sort_by_date_distance<T, F>(records: &[T], today: NaiveDate, date: F) -> Vec<T>
where
    T: Clone,
    F: Fn(&T) -> Option<NaiveDate>,
{
    let mut sorted = records.to_vec();
    sorted.sort_by_key(|record| {
        date(record).map_or(i64::MAX, |day| {
            day.signed_duration_since(today).num_days().abs()
        })
    });
    sorted
}

/// [`sort_by_date_distance`] over the record's own date string.
pub fn sort_orders_by_date_distance<T>(records: &[T], today: NaiveDate) -> Vec<T>
where
    T: OrderRecord + Clone,
{
    sort_by_date_distance(records, today, |record| record.date().and_then(parse_day))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        label: &'static str,
        status: Option<&'static str>,
        priority: Option<&'static str>,
    }

    fn row(label: &'static str, status: &'static str, priority: &'static str) -> Row {
        Row {
            label,
            status: Some(status),
            priority: Some(priority),
        }
    }

    fn labels(rows: &[Row]) -> Vec<&'static str> {
        rows.iter().map(|r| r.label).collect()
    }

    #[test]
    fn equal_ranks_keep_input_order() {
        let order = PriorityOrder::order_priority();
        let rows = vec![
            row("a", "active", "routine"),
            row("b", "active", "stat"),
            row("c", "active", "routine"),
            row("d", "active", "ROUTINE"),
            row("e", "active", "stat"),
        ];
        let sorted = sort_by_rank(&rows, &order, |r| r.priority);
        assert_eq!(labels(&sorted), vec!["b", "e", "a", "c", "d"]);
    }

    #[test]
    fn last_pass_is_the_dominant_key() {
        let priority = PriorityOrder::order_priority();
        let status = PriorityOrder::lifecycle_status();
        let rows = vec![
            row("completed/stat", "completed", "stat"),
            row("active/routine", "active", "routine"),
            row("active/stat", "active", "stat"),
        ];

        let sorted = sort_by_ranks(
            &rows,
            &[
                RankPass::new(&priority, |r: &Row| r.priority),
                RankPass::new(&status, |r: &Row| r.status),
            ],
        );
        assert_eq!(
            labels(&sorted),
            vec!["active/stat", "active/routine", "completed/stat"]
        );

        let reversed = sort_by_ranks(
            &rows,
            &[
                RankPass::new(&status, |r: &Row| r.status),
                RankPass::new(&priority, |r: &Row| r.priority),
            ],
        );
        assert_eq!(
            labels(&reversed),
            vec!["active/stat", "completed/stat", "active/routine"]
        );
    }

    #[test]
    fn missing_and_unknown_values_sort_last() {
        let order = PriorityOrder::lifecycle_status();
        let rows = vec![
            Row {
                label: "none",
                status: None,
                priority: None,
            },
            row("weird", "teleported", "stat"),
            row("done", "completed", "stat"),
        ];
        let sorted = sort_by_rank(&rows, &order, |r| r.status);
        assert_eq!(labels(&sorted), vec!["done", "none", "weird"]);
    }

    #[test]
    fn date_distance_ignores_direction() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let days = vec![
            ("minus-two", today.pred_opt().unwrap().pred_opt()),
            ("today", Some(today)),
            ("undated", None),
            ("plus-one", today.succ_opt()),
            ("minus-one", today.pred_opt()),
        ];
        let sorted = sort_by_date_distance(&days, today, |(_, day)| *day);
        let order: Vec<_> = sorted.iter().map(|(label, _)| *label).collect();
        assert_eq!(
            order,
            vec!["today", "plus-one", "minus-one", "minus-two", "undated"]
        );
    }

    #[test]
    fn empty_input_sorts_to_empty_output() {
        let order = PriorityOrder::severity();
        assert!(sort_by_rank::<Row, _>(&[], &order, |r| r.priority).is_empty());
        assert!(sort_by_ranks::<Row>(&[], &[]).is_empty());
    }
}
