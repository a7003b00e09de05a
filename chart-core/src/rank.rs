//! Priority lookups shared by every comparator-based sort.

use serde::{Deserialize, Serialize};

use crate::ChartError;

/// Rank given to any value that is not part of the reference order.
pub const UNRANKED: usize = 999;

/// Position of `value` inside `order`, ignoring case, or [`UNRANKED`].
///
/// `order` is expected to hold canonical lowercase tokens.
pub fn rank<S: AsRef<str>>(value: &str, order: &[S]) -> usize {
    let needle = value.to_lowercase();
    order
        .iter()
        .position(|token| token.as_ref() == needle)
        .unwrap_or(UNRANKED)
}

/// Ordered list of recognised values, index 0 = highest rank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PriorityOrder {
    tokens: Vec<String>,
}

impl PriorityOrder {
    /// Tokens are trimmed and lowercased, position 0 ranks highest.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(|token| token.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Urgency of an order, most urgent first.
    pub fn order_priority() -> Self {
        Self::new(["stat", "asap", "urgent", "routine", "on_scheduled_date"])
    }

    /// Order lifecycle, live orders first.
    pub fn lifecycle_status() -> Self {
        Self::new([
            "active",
            "on-hold",
            "draft",
            "completed",
            "stopped",
            "revoked",
            "entered-in-error",
        ])
    }

    /// Alert severity, most severe first. Not used by the default config.
    pub fn severity() -> Self {
        Self::new(["critical", "high", "moderate", "low", "info"])
    }

    /// See [`rank`].
    pub fn rank(&self, value: &str) -> usize {
        rank(value, &self.tokens)
    }

    /// Same as [`PriorityOrder::rank`] with a missing value treated as unranked.
    pub fn rank_opt(&self, value: Option<&str>) -> usize {
        value.map_or(UNRANKED, |value| self.rank(value))
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The sentinel only stays last while the order is shorter than it.
    pub fn validate(&self) -> Result<(), ChartError> {
        if self.tokens.is_empty() {
            return Err(ChartError::InvalidConfig(
                "thứ tự ưu tiên không được rỗng".to_string(),
            ));
        }
        if self.tokens.len() >= UNRANKED {
            return Err(ChartError::InvalidConfig(format!(
                "thứ tự ưu tiên có {} giá trị, tối đa {}",
                self.tokens.len(),
                UNRANKED - 1
            )));
        }
        if let Some(blank) = self.tokens.iter().position(String::is_empty) {
            return Err(ChartError::InvalidConfig(format!(
                "thứ tự ưu tiên có giá trị rỗng ở vị trí {blank}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_ignores_case() {
        let order = ["stat", "routine"];
        assert_eq!(rank("STAT", &order), 0);
        assert_eq!(rank("Routine", &order), 1);
    }

    #[test]
    fn unknown_values_get_sentinel() {
        let order = PriorityOrder::lifecycle_status();
        assert_eq!(order.rank("teleported"), UNRANKED);
        assert_eq!(order.rank(""), UNRANKED);
        assert_eq!(order.rank_opt(None), UNRANKED);
        assert!(order.len() < UNRANKED);
    }

    #[test]
    fn constructor_normalises_tokens() {
        let order = PriorityOrder::new([" STAT ", "Routine"]);
        assert_eq!(order.tokens(), ["stat".to_string(), "routine".to_string()]);
        assert_eq!(order.rank("routine"), 1);
    }

    #[test]
    fn validate_rejects_empty_and_oversized_orders() {
        assert!(PriorityOrder::new(Vec::<String>::new()).validate().is_err());

        let oversized = PriorityOrder::new((0..UNRANKED).map(|i| format!("t{i}")));
        assert!(matches!(
            oversized.validate(),
            Err(ChartError::InvalidConfig(_))
        ));

        assert!(PriorityOrder::severity().validate().is_ok());
    }
}
