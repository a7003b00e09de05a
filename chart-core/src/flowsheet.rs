//! Vital-sign flowsheet: one row per concept or concept group, one cell per
//! observation timestamp.
//!
//! Correlated concepts (systolic/diastolic pressure and body position, for
//! example) are merged into a single composite row. Which concepts belong
//! together is fixed by [`ConceptGroup`]; the abnormal flag of a composite
//! cell is derived from each member's normal range, not from the flag the
//! raw observation carried.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::group::parse_timestamp;

/// timestamp -> concept name -> observed value.
///
/// A concept missing at a timestamp was not observed, which is different
/// from an observation with an empty value.
pub type ObservationMatrix = BTreeMap<String, BTreeMap<String, ObservedValue>>;

/// Raw value of one concept at one timestamp, with the flag set by the source.
///
/// Numeric JSON values are kept as their textual form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ObservedValue {
    #[serde(deserialize_with = "text_or_number")]
    pub value: String,
    #[serde(default)]
    pub abnormal: bool,
}

impl ObservedValue {
    pub fn new(value: impl Into<String>, abnormal: bool) -> Self {
        Self {
            value: value.into(),
            abnormal,
        }
    }
}

/// Metadata for one concept, including its normal range.
///
/// Accepts both `snake_case` and the `camelCase` keys sent by JavaScript callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ConceptDetail {
    pub name: String,
    #[serde(default, alias = "fullName")]
    pub full_name: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default, alias = "hiNormal")]
    pub hi_normal: Option<f64>,
    #[serde(default, alias = "lowNormal")]
    pub low_normal: Option<f64>,
}

/// Fixed sets of correlated concepts shown as one composite row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ConceptGroup {
    BloodPressure,
    OxygenSaturation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    /// Shown in the composite value, placeholder when not observed.
    Measurement,
    /// Appended in parentheses, only when observed.
    Qualifier,
}

#[derive(Debug)]
pub struct GroupMember {
    pub concept: &'static str,
    pub role: MemberRole,
}

/// Row label, units and members of a [`ConceptGroup`], in display order.
#[derive(Debug)]
pub struct GroupDefinition {
    pub label: &'static str,
    pub units: &'static str,
    pub members: &'static [GroupMember],
}

impl GroupDefinition {
    pub fn claims(&self, concept: &str) -> bool {
        self.members
            .iter()
            .any(|member| member.concept.eq_ignore_ascii_case(concept))
    }
}

static BLOOD_PRESSURE: GroupDefinition = GroupDefinition {
    label: "Blood pressure",
    units: "mmHg",
    members: &[
        GroupMember {
            concept: "Systolic blood pressure",
            role: MemberRole::Measurement,
        },
        GroupMember {
            concept: "Diastolic blood pressure",
            role: MemberRole::Measurement,
        },
        GroupMember {
            concept: "Body position",
            role: MemberRole::Qualifier,
        },
    ],
};

static OXYGEN_SATURATION: GroupDefinition = GroupDefinition {
    label: "SpO2",
    units: "%",
    members: &[
        GroupMember {
            concept: "Arterial blood oxygen saturation (pulse oximeter)",
            role: MemberRole::Measurement,
        },
        GroupMember {
            concept: "Oxygen delivery",
            role: MemberRole::Qualifier,
        },
    ],
};

/// Per-member breakdown of a composite cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberCell {
    pub concept: String,
    pub value: Option<String>,
    pub display: String,
    /// `None` when the member could not be evaluated against a normal range.
    pub abnormal: Option<bool>,
}

/// One cell of a group row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositeValue {
    pub value: String,
    /// OR of the evaluable members, `false` when none is evaluable.
    pub abnormal: bool,
    pub members: Vec<MemberCell>,
}

impl ConceptGroup {
    pub const ALL: [ConceptGroup; 2] = [ConceptGroup::BloodPressure, ConceptGroup::OxygenSaturation];

    /// Static layout of the group.
    pub fn definition(self) -> &'static GroupDefinition {
        match self {
            ConceptGroup::BloodPressure => &BLOOD_PRESSURE,
            ConceptGroup::OxygenSaturation => &OXYGEN_SATURATION,
        }
    }

    /// The group a concept belongs to, if any.
    pub fn claiming(concept: &str) -> Option<ConceptGroup> {
        Self::ALL
            .into_iter()
            .find(|group| group.definition().claims(concept))
    }

    /// Merges the members observed at one timestamp into a composite value.
    pub fn combine(
        self,
        values: Option<&BTreeMap<String, ObservedValue>>,
        details: &ConceptIndex<'_>,
        placeholder: &str,
    ) -> CompositeValue {
        let definition = self.definition();
        let members: Vec<MemberCell> = definition
            .members
            .iter()
            .map(|member| {
                let observed = values.and_then(|values| find_value(values, member.concept));
                match observed {
                    Some(observed) => MemberCell {
                        concept: member.concept.to_string(),
                        value: Some(observed.value.clone()),
                        display: observed.value.clone(),
                        abnormal: evaluate_member(observed, details.get(member.concept)),
                    },
                    None => MemberCell {
                        concept: member.concept.to_string(),
                        value: None,
                        display: placeholder.to_string(),
                        abnormal: None,
                    },
                }
            })
            .collect();

        let abnormal = members
            .iter()
            .filter_map(|member| member.abnormal)
            .any(|flag| flag);

        CompositeValue {
            value: format_composite(definition, &members),
            abnormal,
            members,
        }
    }
}

/// `None` when no metadata is known for the concept.
///
/// Absent bounds fall back to an open range (`+inf` high, `0` low); values
/// that do not parse as numbers are never out of range.
fn evaluate_member(observed: &ObservedValue, detail: Option<&ConceptDetail>) -> Option<bool> {
    let detail = detail?;
    let hi = detail.hi_normal.unwrap_or(f64::INFINITY);
    let low = detail.low_normal.unwrap_or(0.0);
    let abnormal = match observed.value.trim().parse::<f64>() {
        Ok(number) => number > hi || number < low,
        Err(_) => false,
    };
    Some(abnormal)
}

fn format_composite(definition: &GroupDefinition, members: &[MemberCell]) -> String {
    let mut measurements = Vec::new();
    let mut qualifiers = Vec::new();

    for (member, cell) in definition.members.iter().zip(members) {
        match member.role {
            MemberRole::Measurement => measurements.push(cell.display.as_str()),
            MemberRole::Qualifier => {
                if let Some(value) = cell.value.as_deref().filter(|v| !v.trim().is_empty()) {
                    qualifiers.push(value);
                }
            }
        }
    }

    let mut text = measurements.join(" / ");
    if !qualifiers.is_empty() {
        text.push_str(&format!(" ({})", qualifiers.join(", ")));
    }
    text
}

/// Case-insensitive lookup of concept metadata by name.
#[derive(Debug, Default)]
pub struct ConceptIndex<'a> {
    by_name: HashMap<String, &'a ConceptDetail>,
}

impl<'a> ConceptIndex<'a> {
    pub fn new(details: &'a [ConceptDetail]) -> Self {
        let mut by_name = HashMap::new();
        for detail in details {
            by_name
                .entry(detail.name.to_ascii_lowercase())
                .or_insert(detail);
        }
        Self { by_name }
    }

    /// First entry with a matching name wins.
    pub fn get(&self, concept: &str) -> Option<&'a ConceptDetail> {
        self.by_name.get(&concept.to_ascii_lowercase()).copied()
    }
}

fn find_value<'v>(
    values: &'v BTreeMap<String, ObservedValue>,
    concept: &str,
) -> Option<&'v ObservedValue> {
    values.get(concept).or_else(|| {
        values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(concept))
            .map(|(_, value)| value)
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowSheetRow {
    Group {
        group: ConceptGroup,
        label: String,
        units: String,
        cells: Vec<CompositeValue>,
    },
    Concept {
        name: String,
        label: String,
        units: Option<String>,
        /// `None` where the concept was not observed.
        cells: Vec<Option<ObservedValue>>,
    },
}

impl FlowSheetRow {
    pub fn label(&self) -> &str {
        match self {
            FlowSheetRow::Group { label, .. } | FlowSheetRow::Concept { label, .. } => label,
        }
    }
}

/// Rows of the flowsheet, each with one cell per timestamp column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FlowSheet {
    /// Most recent first; every row has one cell per entry.
    pub timestamps: Vec<String>,
    pub rows: Vec<FlowSheetRow>,
}

impl FlowSheet {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Builds the flowsheet rows for every concept that is described or observed.
///
/// Rows follow the order of `details`, then observed concepts without
/// metadata alphabetically. A group row takes the place of its first member.
pub fn build_flowsheet(
    matrix: &ObservationMatrix,
    details: &[ConceptDetail],
    placeholder: &str,
) -> FlowSheet {
    let timestamps = sorted_timestamps(matrix);
    let index = ConceptIndex::new(details);

    let mut emitted: HashSet<ConceptGroup> = HashSet::new();
    let mut rows = Vec::new();

    for concept in concept_universe(matrix, details) {
        match ConceptGroup::claiming(&concept) {
            Some(group) => {
                if !emitted.insert(group) {
                    continue;
                }
                let definition = group.definition();
                let cells = timestamps
                    .iter()
                    .map(|timestamp| group.combine(matrix.get(timestamp), &index, placeholder))
                    .collect();
                rows.push(FlowSheetRow::Group {
                    group,
                    label: definition.label.to_string(),
                    units: definition.units.to_string(),
                    cells,
                });
            }
            None => {
                let detail = index.get(&concept);
                let cells = timestamps
                    .iter()
                    .map(|timestamp| {
                        matrix
                            .get(timestamp)
                            .and_then(|values| find_value(values, &concept))
                            .cloned()
                    })
                    .collect();
                rows.push(FlowSheetRow::Concept {
                    label: detail
                        .and_then(|detail| detail.full_name.clone())
                        .unwrap_or_else(|| concept.clone()),
                    units: detail.and_then(|detail| detail.units.clone()),
                    name: concept,
                    cells,
                });
            }
        }
    }

    debug!(
        timestamps = timestamps.len(),
        rows = rows.len(),
        groups = emitted.len(),
        "built flowsheet"
    );

    FlowSheet { timestamps, rows }
}

fn concept_universe(matrix: &ObservationMatrix, details: &[ConceptDetail]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for detail in details {
        if seen.insert(detail.name.to_ascii_lowercase()) {
            names.push(detail.name.clone());
        }
    }

    let observed: BTreeSet<&String> = matrix.values().flat_map(|values| values.keys()).collect();
    for name in observed {
        if seen.insert(name.to_ascii_lowercase()) {
            names.push(name.clone());
        }
    }

    names
}

/// Most recent first; timestamps that do not parse go last.
fn sorted_timestamps(matrix: &ObservationMatrix) -> Vec<String> {
    let mut timestamps: Vec<(Option<NaiveDateTime>, &String)> = matrix
        .keys()
        .map(|timestamp| (parse_instant(timestamp), timestamp))
        .collect();
    timestamps.sort_by(|a, b| b.cmp(a));
    timestamps
        .into_iter()
        .map(|(_, timestamp)| timestamp.clone())
        .collect()
}

fn parse_instant(value: &str) -> Option<NaiveDateTime> {
    parse_timestamp(value).map(|instant| instant.naive_utc())
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    })
}
