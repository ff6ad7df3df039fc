use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Stored recording or screenshot; both tables share this shape
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MediaFile {
    pub id: Uuid,
    pub class_id: Uuid,
    pub teacher_id: Uuid,
    pub original_name: String,
    pub stored_path: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub drive_file_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MediaFile {
    /// Public URL under the static `/uploads` mount
    pub fn url(&self) -> String {
        format!("/uploads/{}", self.stored_path)
    }
}

/// API shape of a media row: the row plus its public URL
#[derive(Debug, Clone, Serialize)]
pub struct MediaView {
    #[serde(flatten)]
    pub file: MediaFile,
    pub url: String,
}

impl From<MediaFile> for MediaView {
    fn from(file: MediaFile) -> Self {
        let url = file.url();
        Self { file, url }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MediaFilter {
    pub class_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
