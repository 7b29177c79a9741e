//! Query building for the quote collection.
//!
//! The listing filter and sort order are plain domain values so that every
//! `QuoteRepository` implementation can honour them; the functions at the
//! bottom translate them into MongoDB documents and reshape `$facet` output.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use bson::{doc, Bson, Document};

use crate::model::quote::{Priority, ProjectType, QuoteRequest, QuoteStatus};
use crate::model::quote_stats::{QuoteStats, RecentQuote, StatsTotals};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

/// Fields a listing may be sorted by, with their stored names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Name,
    Email,
    Status,
    Priority,
    ProjectType,
    Budget,
    EstimatedValue,
}

impl SortField {
    pub const NAMES: &'static [&'static str] = &[
        "createdAt",
        "updatedAt",
        "name",
        "email",
        "status",
        "priority",
        "projectType",
        "budget",
        "estimatedValue",
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "createdAt" => SortField::CreatedAt,
            "updatedAt" => SortField::UpdatedAt,
            "name" => SortField::Name,
            "email" => SortField::Email,
            "status" => SortField::Status,
            "priority" => SortField::Priority,
            "projectType" => SortField::ProjectType,
            "budget" => SortField::Budget,
            "estimatedValue" => SortField::EstimatedValue,
            _ => return None,
        };
        Some(field)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
            SortField::Name => "name",
            SortField::Email => "email",
            SortField::Status => "status",
            SortField::Priority => "priority",
            SortField::ProjectType => "projectType",
            SortField::Budget => "budget",
            SortField::EstimatedValue => "estimatedValue",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: SortField,
    pub descending: bool,
}

/// Ordered list of sort keys, parsed from a Mongoose-style expression
/// such as `-createdAt` or `status,-estimatedValue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOrder(pub Vec<SortKey>);

impl SortOrder {
    pub const DEFAULT_EXPR: &'static str = "-createdAt";

    pub fn newest_first() -> Self {
        SortOrder(vec![SortKey { field: SortField::CreatedAt, descending: true }])
    }

    pub fn parse(expr: &str) -> Result<Self, String> {
        let mut keys = Vec::new();
        for token in expr.split(|c: char| c == ',' || c.is_whitespace()) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let (descending, name) = match token.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, token.strip_prefix('+').unwrap_or(token)),
            };
            let field = SortField::from_name(name).ok_or_else(|| {
                format!(
                    "Invalid sort field '{}'. Allowed fields: {}",
                    name,
                    SortField::NAMES.join(", ")
                )
            })?;
            keys.push(SortKey { field, descending });
        }
        if keys.is_empty() {
            return Ok(Self::newest_first());
        }
        Ok(SortOrder(keys))
    }

    /// Orders two records the way MongoDB would: strings
    /// lexically, missing numbers before present ones.
    ///
    /// Not used by `MongoQuoteRepository`, which sorts server side with
    /// `to_document`. Exists for in-memory `QuoteRepository` implementations
    /// such as the one the integration tests run against.
    pub fn compare(&self, a: &QuoteRequest, b: &QuoteRequest) -> Ordering {
        for key in &self.0 {
            let ordering = match key.field {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::Name => a.name.cmp(&b.name),
                SortField::Email => a.email.cmp(&b.email),
                SortField::Status => a.status.as_str().cmp(b.status.as_str()),
                SortField::Priority => a.priority.as_str().cmp(b.priority.as_str()),
                SortField::ProjectType => a.project_type.as_str().cmp(b.project_type.as_str()),
                SortField::Budget => a.budget.as_str().cmp(b.budget.as_str()),
                SortField::EstimatedValue => match (a.estimated_value, b.estimated_value) {
                    (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                },
            };
            let ordering = if key.descending { ordering.reverse() } else { ordering };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    pub fn to_document(&self) -> Document {
        let mut sort = Document::new();
        for key in &self.0 {
            sort.insert(key.field.as_str(), if key.descending { -1 } else { 1 });
        }
        sort
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::newest_first()
    }
}

/// Listing filter. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuoteFilter {
    pub status: Option<QuoteStatus>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
}

impl QuoteFilter {
    /// In-process evaluation of the same predicate `to_document` expresses.
    ///
    /// Only in-memory `QuoteRepository` implementations (the integration
    /// test store) call this; the MongoDB repository filters server side.
    pub fn matches(&self, quote: &QuoteRequest) -> bool {
        if self.status.is_some_and(|s| s != quote.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != quote.priority) {
            return false;
        }
        match &self.search {
            Some(term) => {
                let term = term.to_lowercase();
                quote.name.to_lowercase().contains(&term)
                    || quote.email.to_lowercase().contains(&term)
                    || quote
                        .company
                        .as_ref()
                        .is_some_and(|c| c.to_lowercase().contains(&term))
            }
            None => true,
        }
    }

    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();
        if let Some(status) = self.status {
            filter.insert("status", status.as_str());
        }
        if let Some(priority) = self.priority {
            filter.insert("priority", priority.as_str());
        }
        if let Some(term) = &self.search {
            let pattern = regex::escape(term);
            filter.insert(
                "$or",
                vec![
                    doc! { "name": { "$regex": pattern.clone(), "$options": "i" } },
                    doc! { "email": { "$regex": pattern.clone(), "$options": "i" } },
                    doc! { "company": { "$regex": pattern, "$options": "i" } },
                ],
            );
        }
        filter
    }
}

/// One page request: filter, order and window.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteListParams {
    pub filter: QuoteFilter,
    pub sort: SortOrder,
    pub page: u64,
    pub limit: u64,
}

impl QuoteListParams {
    /// Documents to skip before the page, or `None` when the offset is past
    /// anything the server can address (the page is then empty).
    pub fn skip(&self) -> Option<u64> {
        self.page
            .saturating_sub(1)
            .checked_mul(self.limit)
            .filter(|skip| i64::try_from(*skip).is_ok())
    }
}

pub const RECENT_LIMIT: i64 = 5;

/// `$group` + `$sort` stages counting documents per value of `field`.
fn count_by(field: &str) -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": format!("${}", field), "count": { "$sum": 1 } } },
        doc! { "$sort": { "_id": 1 } },
    ]
}

/// Pipeline producing the status histogram over the whole collection.
pub fn status_histogram_pipeline() -> Vec<Document> {
    count_by("status")
}

/// The single `$facet` aggregation behind the admin statistics endpoint.
pub fn stats_pipeline() -> Vec<Document> {
    vec![doc! {
        "$facet": {
            "byStatus": count_by("status"),
            "byPriority": count_by("priority"),
            "byProjectType": count_by("projectType"),
            "totals": [
                { "$group": {
                    "_id": Bson::Null,
                    "count": { "$sum": 1 },
                    "totalValue": { "$sum": "$estimatedValue" },
                    "avgValue": { "$avg": "$estimatedValue" },
                } },
                { "$project": { "_id": 0 } },
            ],
            "recent": [
                { "$sort": { "createdAt": -1 } },
                { "$limit": RECENT_LIMIT },
                { "$project": {
                    "name": 1,
                    "email": 1,
                    "projectType": 1,
                    "status": 1,
                    "createdAt": 1,
                } },
            ],
        }
    }]
}

fn as_u64(value: Option<&Bson>) -> u64 {
    match value {
        Some(Bson::Int32(v)) => (*v).max(0) as u64,
        Some(Bson::Int64(v)) => (*v).max(0) as u64,
        Some(Bson::Double(v)) if *v >= 0.0 => *v as u64,
        _ => 0,
    }
}

fn as_f64(value: Option<&Bson>) -> f64 {
    match value {
        Some(Bson::Int32(v)) => *v as f64,
        Some(Bson::Int64(v)) => *v as f64,
        Some(Bson::Double(v)) => *v,
        _ => 0.0,
    }
}

/// Turns `[{_id: "pending", count: 3}, ...]` into `{"pending": 3, ...}`.
/// Groups whose key is missing or not a string are dropped.
pub fn reshape_counts<'a, I>(groups: I) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a Document>,
{
    groups
        .into_iter()
        .filter_map(|group| match group.get("_id") {
            Some(Bson::String(key)) => Some((key.clone(), as_u64(group.get("count")))),
            _ => None,
        })
        .collect()
}

/// Status histogram listing every status, zero-filled.
pub fn zero_filled_status_counts(counts: BTreeMap<String, u64>) -> BTreeMap<String, u64> {
    let mut histogram: BTreeMap<String, u64> = QuoteStatus::VALUES
        .iter()
        .map(|status| (status.to_string(), 0))
        .collect();
    for (status, count) in counts {
        *histogram.entry(status).or_insert(0) += count;
    }
    histogram
}

fn facet<'a>(result: &'a Document, name: &str) -> RepositoryResult<Vec<&'a Document>> {
    let array = result
        .get_array(name)
        .map_err(|e| RepositoryError::serialization(format!("Missing facet '{}': {}", name, e)))?;
    Ok(array.iter().filter_map(Bson::as_document).collect())
}

/// Converts the single document produced by [`stats_pipeline`] into [`QuoteStats`].
pub fn reshape_stats(result: &Document) -> RepositoryResult<QuoteStats> {
    let by_status = reshape_counts(facet(result, "byStatus")?);
    let by_priority = reshape_counts(facet(result, "byPriority")?);
    let by_project_type = reshape_counts(facet(result, "byProjectType")?);

    let totals = match facet(result, "totals")?.first() {
        Some(totals) => StatsTotals {
            count: as_u64(totals.get("count")),
            total_value: as_f64(totals.get("totalValue")),
            avg_value: as_f64(totals.get("avgValue")),
        },
        None => StatsTotals::default(),
    };

    let recent = facet(result, "recent")?
        .into_iter()
        .map(|doc| -> RepositoryResult<RecentQuote> {
            let id = doc
                .get_object_id("_id")
                .map_err(|e| RepositoryError::serialization(format!("Recent quote without id: {}", e)))?;
            let text = |key: &str| doc.get_str(key).unwrap_or_default().to_string();
            Ok(RecentQuote {
                id: id.to_hex(),
                name: text("name"),
                email: text("email"),
                project_type: text("projectType").parse::<ProjectType>().ok(),
                status: text("status").parse::<QuoteStatus>().unwrap_or_default(),
                created_at: text("createdAt"),
            })
        })
        .collect::<RepositoryResult<Vec<_>>>()?;

    Ok(QuoteStats { by_status, by_priority, by_project_type, totals, recent })
}
