//! Collapsing of "this order replaces that order" revision chains.

use std::collections::HashSet;

use tracing::debug;

/// A record that may supersede earlier records of the same collection.
pub trait Revisable {
    fn id(&self) -> &str;

    /// Ids this record supersedes. Empty when it is not a revision.
    fn replaces(&self) -> &[String];
}

/// Ids referenced by any record's `replaces` list.
pub fn superseded_ids<T: Revisable>(records: &[T]) -> HashSet<&str> {
    records
        .iter()
        .flat_map(|record| record.replaces().iter().map(String::as_str))
        .collect()
}

/// True when `record` takes part in a revision relationship, either as the
/// superseding or the superseded side.
pub fn is_involved_in_revision<T: Revisable>(record: &T, superseded: &HashSet<&str>) -> bool {
    !record.replaces().is_empty() || superseded.contains(record.id())
}

/// Keeps only the records that are neither a revision nor revised.
///
/// Each link of a chain declares a non-empty `replaces` and is referenced by
/// its successor, so set membership alone removes whole chains.
pub fn resolve_revisions<T: Revisable + Clone>(records: &[T]) -> Vec<T> {
    let superseded = superseded_ids(records);
    let resolved: Vec<T> = records
        .iter()
        .filter(|record| !is_involved_in_revision(*record, &superseded))
        .cloned()
        .collect();

    debug!(
        input = records.len(),
        kept = resolved.len(),
        removed = records.len() - resolved.len(),
        "resolved revision chains"
    );

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Rev {
        id: String,
        replaces: Vec<String>,
    }

    fn rev(id: &str, replaces: &[&str]) -> Rev {
        Rev {
            id: id.to_string(),
            replaces: replaces.iter().map(|s| s.to_string()).collect(),
        }
    }

    impl Revisable for Rev {
        fn id(&self) -> &str {
            &self.id
        }

        fn replaces(&self) -> &[String] {
            &self.replaces
        }
    }

    fn ids(records: &[Rev]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn chain_collapses_to_standalone_records() {
        let records = vec![rev("A", &[]), rev("B", &["A"]), rev("C", &["B"]), rev("D", &[])];
        assert_eq!(ids(&resolve_revisions(&records)), vec!["D"]);
    }

    #[test]
    fn shared_predecessor_removes_both_successors() {
        let records = vec![
            rev("A", &[]),
            rev("B", &["A"]),
            rev("C", &["A"]),
            rev("E", &[]),
        ];
        assert_eq!(ids(&resolve_revisions(&records)), vec!["E"]);
    }

    #[test]
    fn reference_to_unknown_id_still_removes_the_revision() {
        let records = vec![rev("B", &["gone"]), rev("D", &[])];
        assert_eq!(ids(&resolve_revisions(&records)), vec!["D"]);
    }

    #[test]
    fn input_is_left_untouched_and_empty_input_is_fine() {
        let records = vec![rev("A", &[]), rev("B", &["A"])];
        let before = records.clone();
        let _ = resolve_revisions(&records);
        assert_eq!(records, before);
        assert!(resolve_revisions::<Rev>(&[]).is_empty());
    }
}
