//! End-to-end consolidation of one patient's already-fetched records.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::flowsheet::{build_flowsheet, ConceptDetail, FlowSheet, ObservationMatrix};
use crate::group::{day_key_or_undated, group_by_date, sort_groups_descending, DateGroup};
use crate::records::{ClinicalOrder, MedicationOrder, OrderRecord};
use crate::revision::resolve_revisions;
use crate::sort::{sort_by_priority_then_status, sort_orders_by_date_distance};
use crate::{ChartConfig, ChartError};

/// Observation matrix plus the metadata used to evaluate it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct VitalsInput {
    #[serde(default)]
    pub concepts: Vec<ConceptDetail>,
    #[serde(default)]
    pub observations: ObservationMatrix,
}

/// Records as handed over by the data-access layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ChartInput {
    /// Reference day for medication ordering. Defaults to the current UTC date.
    #[serde(default)]
    pub today: Option<NaiveDate>,
    #[serde(default)]
    pub orders: Vec<ClinicalOrder>,
    #[serde(default)]
    pub medications: Vec<MedicationOrder>,
    #[serde(default)]
    pub vitals: VitalsInput,
}

/// Display-ready tables for one patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartSnapshot {
    pub generated_at: DateTime<Utc>,
    pub orders: Vec<DateGroup<ClinicalOrder>>,
    pub medications: Vec<MedicationOrder>,
    pub flowsheet: FlowSheet,
}

/// Current orders grouped per day, most recent day first.
///
/// Within a day orders are grouped by status and ranked by priority; grouping
/// keeps the order produced by the sort, so no second pass is needed.
pub fn consolidate_orders<T>(records: &[T], config: &ChartConfig) -> Vec<DateGroup<T>>
where
    T: OrderRecord + Clone,
{
    let current = resolve_revisions(records);
    let sorted = sort_by_priority_then_status(&current, config);
    let mut groups = group_by_date(&sorted, |record| day_key_or_undated(record.date()));
    sort_groups_descending(&mut groups);

    debug!(
        records = records.len(),
        current = current.len(),
        days = groups.len(),
        "consolidated orders"
    );

    groups
}

/// Current medications, ungrouped.
///
/// Status is the dominant key, priority breaks ties within a status and the
/// distance of the start date to `today` breaks the remaining ties.
pub fn consolidate_medications<T>(records: &[T], config: &ChartConfig, today: NaiveDate) -> Vec<T>
where
    T: OrderRecord + Clone,
{
    let current = resolve_revisions(records);
    let by_distance = sort_orders_by_date_distance(&current, today);
    let sorted = sort_by_priority_then_status(&by_distance, config);

    debug!(
        records = records.len(),
        current = sorted.len(),
        "consolidated medications"
    );

    sorted
}

/// Builds the full snapshot for `today`. Never fails; see [`summarize_value`]
/// for the checked JSON entry point.
pub fn summarize(input: &ChartInput, config: &ChartConfig, today: NaiveDate) -> ChartSnapshot {
    ChartSnapshot {
        generated_at: Utc::now(),
        orders: consolidate_orders(&input.orders, config),
        medications: consolidate_medications(&input.medications, config, today),
        flowsheet: build_flowsheet(
            &input.vitals.observations,
            &input.vitals.concepts,
            &config.placeholder,
        ),
    }
}

/// Summarize records from a JSON string.
pub fn summarize_str(input_json: &str, config: &ChartConfig) -> Result<ChartSnapshot, ChartError> {
    let value: Value = serde_json::from_str(input_json)?;
    summarize_value(&value, config)
}

/// Summarize records from a `serde_json::Value`.
pub fn summarize_value(input: &Value, config: &ChartConfig) -> Result<ChartSnapshot, ChartError> {
    if !input.is_object() {
        return Err(ChartError::MissingData);
    }
    config.validate()?;

    let input = ChartInput::deserialize(input)?;
    let today = input.today.unwrap_or_else(|| Utc::now().date_naive());
    Ok(summarize(&input, config, today))
}
