use std::{borrow::Cow, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{date_codec, errors::AppError, media::{DemoPreview, GalleryMedia, MediaFields}};

// ───── Constants ──────────────────────────────────────────────────────
const MAX_TITLE_LENGTH: u64 = 120;
const MAX_DESCRIPTION_LENGTH: u64 = 5000;
const MAX_TECHNOLOGIES: usize = 30;

// ───── Project type ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    #[default]
    Web,
    Mobile,
    Desktop,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Web => "web",
            ProjectType::Mobile => "mobile",
            ProjectType::Desktop => "desktop",
        }
    }

    /// Label shown on gallery cards and filter tabs.
    pub fn label(&self) -> &'static str {
        match self {
            ProjectType::Web => "Web",
            ProjectType::Mobile => "Mobile",
            ProjectType::Desktop => "Desktop",
        }
    }
}

impl FromStr for ProjectType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "web" => Ok(ProjectType::Web),
            "mobile" => Ok(ProjectType::Mobile),
            "desktop" => Ok(ProjectType::Desktop),
            other => Err(AppError::InvalidInput(format!("Unknown project type: {}", other))),
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub date: NaiveDate,
    pub project_type: String,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub image_url: Option<String>,
    pub gif_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One portfolio project as persisted by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRecord {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub image_url: Option<String>,
    pub gif_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated draft handed to the store on creation; the store assigns the
/// id and both timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInsert {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub date: NaiveDate,
    pub project_type: ProjectType,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub image_url: Option<String>,
    pub gif_url: Option<String>,
}

// ───── Input & Validation Requests ──────────────────────────────────

/// The admin form. `display_date` is the only date the user edits; it is
/// converted at save time and never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectForm {
    #[validate(
        length(max = MAX_TITLE_LENGTH),
        custom(function = "validate_required_text")
    )]
    pub title: String,

    #[validate(
        length(max = MAX_DESCRIPTION_LENGTH),
        custom(function = "validate_required_text")
    )]
    pub description: String,

    #[serde(deserialize_with = "deserialize_technologies")]
    #[validate(custom(function = "validate_technologies"))]
    pub technologies: Vec<String>,

    #[serde(default)]
    pub display_date: String,

    #[serde(rename = "type", default)]
    pub project_type: ProjectType,

    #[serde(default, deserialize_with = "deserialize_optional_url")]
    #[validate(custom(function = "validate_url"))]
    pub github_url: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_url")]
    #[validate(custom(function = "validate_url"))]
    pub demo_url: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_url")]
    #[validate(custom(function = "validate_url"))]
    pub image_url: Option<String>,

    #[serde(default, deserialize_with = "deserialize_optional_url")]
    #[validate(custom(function = "validate_url"))]
    pub gif_url: Option<String>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryCard {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub type_label: &'static str,
    pub date: NaiveDate,
    pub display_date: String,
    pub github_url: Option<String>,
    pub demo_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub demo_preview: Option<DemoPreview>,
}

// ───── Validation Helpers ───────────────────────────────────────────

pub fn validate_required_text(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(new_validation_error("required", "This field is required"));
    }
    Ok(())
}

pub fn validate_technologies(technologies: &[String]) -> Result<(), ValidationError> {
    let count = technologies.iter().filter(|t| !t.trim().is_empty()).count();
    if count == 0 {
        return Err(new_validation_error("technologies_empty", "At least one technology is required"));
    }
    if count > MAX_TECHNOLOGIES {
        return Err(new_validation_error("too_many_technologies", "Too many technologies provided"));
    }
    Ok(())
}

pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    match url::Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        Ok(_) => Err(new_validation_error("invalid_url_scheme", "URL must start with http:// or https://")),
        Err(_) => Err(new_validation_error("invalid_url", "Invalid URL format")),
    }
}

fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

/// Splits a comma separated technologies field, dropping blanks.
pub fn parse_technologies(input: &str) -> Vec<String> {
    normalize_technologies(input.split(',').map(str::to_string))
}

pub fn normalize_technologies(items: impl IntoIterator<Item = String>) -> Vec<String> {
    items
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TechnologiesInput {
    List(Vec<String>),
    Text(String),
}

fn deserialize_technologies<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TechnologiesInput::deserialize(deserializer)? {
        TechnologiesInput::List(items) => normalize_technologies(items),
        TechnologiesInput::Text(text) => parse_technologies(&text),
    })
}

fn deserialize_optional_url<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(non_empty(value))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ───── Conversions ──────────────────────────────────────────────────

impl TryFrom<ProjectRow> for ProjectRecord {
    type Error = AppError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        Ok(ProjectRecord {
            id: row.id,
            title: row.title,
            description: row.description,
            technologies: row.technologies,
            date: row.date,
            project_type: row.project_type.parse()?,
            github_url: row.github_url,
            demo_url: row.demo_url,
            image_url: row.image_url,
            gif_url: row.gif_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl ProjectForm {
    /// Cleans free-text input the way the admin form does before validation.
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.technologies = normalize_technologies(self.technologies);
        self.github_url = non_empty(self.github_url);
        self.demo_url = non_empty(self.demo_url);
        self.image_url = non_empty(self.image_url);
        self.gif_url = non_empty(self.gif_url);
        self
    }

    /// Fills the edit form from a stored record.
    pub fn from_record(record: &ProjectRecord) -> Self {
        ProjectForm {
            title: record.title.clone(),
            description: record.description.clone(),
            technologies: record.technologies.clone(),
            display_date: date_codec::format_display(record.date),
            project_type: record.project_type,
            github_url: record.github_url.clone(),
            demo_url: record.demo_url.clone(),
            image_url: record.image_url.clone(),
            gif_url: record.gif_url.clone(),
        }
    }

    pub fn media(&self) -> MediaFields {
        MediaFields {
            image_url: self.image_url.clone(),
            gif_url: self.gif_url.clone(),
        }
    }

    /// Validates the form and converts the display date.
    pub fn prepare_for_insert(&self, media: MediaFields) -> Result<ProjectInsert, AppError> {
        self.validate()?;
        let date = date_codec::to_storage(&self.display_date)?;

        Ok(ProjectInsert {
            title: self.title.clone(),
            description: self.description.clone(),
            technologies: normalize_technologies(self.technologies.clone()),
            date,
            project_type: self.project_type,
            github_url: self.github_url.clone(),
            demo_url: self.demo_url.clone(),
            image_url: media.image_url,
            gif_url: media.gif_url,
        })
    }
}

impl ProjectRecord {
    /// Builds the record a store would persist for `insert` at `now`.
    pub fn from_insert(id: Uuid, insert: &ProjectInsert, now: DateTime<Utc>) -> Self {
        ProjectRecord {
            id,
            title: insert.title.clone(),
            description: insert.description.clone(),
            technologies: insert.technologies.clone(),
            date: insert.date,
            project_type: insert.project_type,
            github_url: insert.github_url.clone(),
            demo_url: insert.demo_url.clone(),
            image_url: insert.image_url.clone(),
            gif_url: insert.gif_url.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an edited draft, keeping identity and creation time.
    pub fn with_changes(&self, insert: ProjectInsert) -> Self {
        ProjectRecord {
            id: self.id,
            title: insert.title,
            description: insert.description,
            technologies: insert.technologies,
            date: insert.date,
            project_type: insert.project_type,
            github_url: insert.github_url,
            demo_url: insert.demo_url,
            image_url: insert.image_url,
            gif_url: insert.gif_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    pub fn to_gallery_card(&self) -> GalleryCard {
        let media = GalleryMedia::for_record(self);

        GalleryCard {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            technologies: self.technologies.clone(),
            project_type: self.project_type,
            type_label: self.project_type.label(),
            date: self.date,
            display_date: date_codec::format_display(self.date),
            github_url: self.github_url.clone(),
            demo_url: self.demo_url.clone(),
            thumbnail_url: media.thumbnail.map(str::to_string),
            demo_preview: media.demo_preview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ProjectForm {
        ProjectForm {
            title: "Portfolio".into(),
            description: "Personal site".into(),
            technologies: vec!["React".into(), "TypeScript".into()],
            display_date: "Janvier 2024".into(),
            project_type: ProjectType::Web,
            ..Default::default()
        }
    }

    #[test]
    fn technologies_accept_comma_separated_text() {
        let json = serde_json::json!({
            "title": "Portfolio",
            "description": "Personal site",
            "technologies": "React, TypeScript, ,Tailwind,",
            "displayDate": "Mars 2023",
            "type": "mobile",
            "githubUrl": ""
        });

        let form: ProjectForm = serde_json::from_value(json).unwrap();

        assert_eq!(form.technologies, vec!["React", "TypeScript", "Tailwind"]);
        assert_eq!(form.project_type, ProjectType::Mobile);
        assert_eq!(form.github_url, None);
    }

    #[test]
    fn blank_technologies_fail_validation() {
        let mut draft = form();
        draft.technologies = vec!["  ".into(), "".into()];

        let err = draft.prepare_for_insert(MediaFields::default()).unwrap_err();
        match err {
            AppError::ValidationError(fields) => assert_eq!(fields[0].field, "technologies"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn blank_title_fails_validation() {
        let mut draft = form();
        draft.title = "   ".into();

        assert!(matches!(
            draft.prepare_for_insert(MediaFields::default()),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn non_http_urls_are_rejected() {
        let mut draft = form();
        draft.demo_url = Some("ftp://example.com/demo".into());

        assert!(matches!(
            draft.prepare_for_insert(MediaFields::default()),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn insert_carries_storage_date() {
        let insert = form().prepare_for_insert(MediaFields::default()).unwrap();

        assert_eq!(insert.date.to_string(), "2024-01-01");
    }

    #[test]
    fn bad_display_date_is_reported_as_date_error() {
        let mut draft = form();
        draft.display_date = "Smarch 2024".into();

        assert!(matches!(
            draft.prepare_for_insert(MediaFields::default()),
            Err(AppError::InvalidDateFormat)
        ));
    }

    #[test]
    fn edit_form_shows_display_date() {
        let insert = form().prepare_for_insert(MediaFields::default()).unwrap();
        let record = ProjectRecord::from_insert(Uuid::new_v4(), &insert, Utc::now());

        let edit = ProjectForm::from_record(&record);

        assert_eq!(edit.display_date, "Janvier 2024");
    }

    #[test]
    fn record_serializes_with_camel_case_and_type() {
        let insert = form().prepare_for_insert(MediaFields::default()).unwrap();
        let record = ProjectRecord::from_insert(Uuid::new_v4(), &insert, Utc::now());

        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["type"], "web");
        assert_eq!(value["date"], "2024-01-01");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("displayDate").is_none());
    }
}
