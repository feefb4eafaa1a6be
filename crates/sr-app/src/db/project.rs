use serde::{Deserialize, Serialize};
use surrealdb_types::{RecordId, SurrealValue};

/// Marker a record carries once both images are stored and the project is
/// ready to be shown.
pub const VISIBLE: &str = "visible";

/// Content written per project; the record id is the project name.
#[derive(Debug, Clone, Serialize, Deserialize, SurrealValue, PartialEq)]
pub struct Project {
    pub project_name: String,
    pub text: String,
    pub environment: String,
    pub before_image_url: String,
    pub after_image_url: String,
    pub user: String,
    pub architectural_style: Option<String>,
    pub weather: Option<String>,
    pub additional_options: Option<String>,
    pub hours: Option<String>,
    pub status: String,
}

#[derive(Debug, Deserialize, SurrealValue, Clone)]
pub struct ProjectRecord {
    pub id: RecordId,
    pub project_name: String,
    pub text: String,
    pub environment: String,
    pub before_image_url: String,
    pub after_image_url: String,
    pub user: String,
    pub architectural_style: Option<String>,
    pub weather: Option<String>,
    pub additional_options: Option<String>,
    pub hours: Option<String>,
    pub status: String,
}
