/// Request and response bodies shared by the MCP tools and the HTTP API.
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::card::CourseCard;
use crate::catalog::ImportOutcome;
use crate::filter::{Modality, PriceBracket};
use crate::model::{ExtractionStatus, FilterCriteria, Shift};

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LoginParams {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SessionParams {
    pub session_token: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImportPdfParams {
    pub session_token: String,
    /// Local filesystem path of the PDF to import.
    pub path: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CourseListResponse {
    pub courses: Vec<CourseCard>,
    /// Size of the whole catalog.
    pub total: usize,
    /// Number of courses that passed the filters.
    pub matched: usize,
    /// Selector filters in use, not counting the text search.
    pub active_filters: usize,
}

impl CourseListResponse {
    pub fn new(courses: Vec<CourseCard>, total: usize, criteria: &FilterCriteria) -> Self {
        Self {
            matched: courses.len(),
            courses,
            total,
            active_filters: criteria.active_count(),
        }
    }
}

/// Values the selector filters accept.
#[derive(Debug, Serialize, JsonSchema)]
pub struct CategoryListResponse {
    pub categories: Vec<String>,
    pub shifts: Vec<String>,
    pub modalities: Vec<String>,
    pub price_ranges: Vec<String>,
}

impl CategoryListResponse {
    pub fn new(categories: Vec<String>) -> Self {
        Self {
            categories,
            shifts: Shift::CANONICAL
                .iter()
                .map(|s| s.label().to_string())
                .collect(),
            modalities: Modality::ALL
                .iter()
                .map(|m| m.filter_value().to_string())
                .collect(),
            price_ranges: PriceBracket::ALL
                .iter()
                .map(|b| b.filter_value().to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct StatusResponse {
    pub status: ExtractionStatus,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ImportResponse {
    pub imported: usize,
    pub message: String,
    /// Filters reset after a successful import.
    pub filters: FilterCriteria,
}

impl From<ImportOutcome> for ImportResponse {
    fn from(outcome: ImportOutcome) -> Self {
        Self {
            imported: outcome.imported,
            message: outcome.message,
            filters: outcome.filters,
        }
    }
}
