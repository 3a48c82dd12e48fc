use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Full collection as returned by `GET /activities`, keyed by activity name.
/// Backend order is preserved.
pub type ActivityMap = IndexMap<String, Activity>;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Activity {
    pub description: String,
    pub schedule: String,
    pub max_participants: i64,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SignupResult {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<String>,
}
