use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::quote::{ProjectType, QuoteStatus};

/// Totals facet. Zeroed when the collection is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsTotals {
    pub count: u64,
    pub total_value: f64,
    pub avg_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentQuote {
    pub id: String,
    pub name: String,
    pub email: String,
    pub project_type: Option<ProjectType>,
    pub status: QuoteStatus,
    pub created_at: String,
}

/// Result of the admin statistics aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteStats {
    pub by_status: BTreeMap<String, u64>,
    pub by_priority: BTreeMap<String, u64>,
    pub by_project_type: BTreeMap<String, u64>,
    pub totals: StatsTotals,
    pub recent: Vec<RecentQuote>,
}
