//! Display-oriented order records as handed over by the data-access layer.

use serde::{Deserialize, Serialize};

use crate::revision::Revisable;

/// Fields every order sorter and grouper needs.
pub trait OrderRecord: Revisable {
    fn priority(&self) -> Option<&str>;
    fn status(&self) -> Option<&str>;
    /// Date or timestamp string the order is filed under.
    fn date(&self) -> Option<&str>;
}

/// Order category, `other` when the source did not say.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Lab,
    Radiology,
    Procedure,
    #[default]
    Other,
}

/// Lab or radiology order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ClinicalOrder {
    pub id: String,
    #[serde(default)]
    pub replaces: Vec<String>,
    #[serde(default)]
    pub kind: OrderKind,
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ordered_at: Option<String>,
    #[serde(default)]
    pub orderer: Option<String>,
}

/// Medication order. `start_date` is what date-distance sorting measures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MedicationOrder {
    pub id: String,
    #[serde(default)]
    pub replaces: Vec<String>,
    #[serde(default)]
    pub drug: String,
    #[serde(default)]
    pub dose: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub prescriber: Option<String>,
}

impl Revisable for ClinicalOrder {
    fn id(&self) -> &str {
        &self.id
    }

    fn replaces(&self) -> &[String] {
        &self.replaces
    }
}

impl OrderRecord for ClinicalOrder {
    fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn date(&self) -> Option<&str> {
        self.ordered_at.as_deref()
    }
}

impl Revisable for MedicationOrder {
    fn id(&self) -> &str {
        &self.id
    }

    fn replaces(&self) -> &[String] {
        &self.replaces
    }
}

impl OrderRecord for MedicationOrder {
    fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn date(&self) -> Option<&str> {
        self.start_date.as_deref()
    }
}
