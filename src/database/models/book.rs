use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{ApiError, FieldErrors};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub level: Option<String>,
    pub description: Option<String>,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub level: Option<String>,
    pub description: Option<String>,
    pub file_url: Option<String>,
}

fn check_url(errors: &mut FieldErrors, file_url: Option<&str>) {
    if let Some(raw) = file_url {
        let valid = url::Url::parse(raw)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        errors.check("file_url", valid, "Must be an http(s) URL");
    }
}

impl CreateBook {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.require_text("title", Some(&self.title));
        check_url(&mut errors, self.file_url.as_deref());
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub level: Option<String>,
    pub description: Option<String>,
    pub file_url: Option<String>,
}

impl UpdateBook {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &self.title {
            errors.require_text("title", Some(title));
        }
        check_url(&mut errors, self.file_url.as_deref());
        errors.into_result()
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BookFilter {
    pub level: Option<String>,
    pub search: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_url_must_be_web_link() {
        let book = CreateBook {
            title: "Oxford Phonics 1".into(),
            level: None,
            description: None,
            file_url: Some("ftp://files/book.pdf".into()),
        };
        assert!(book.validate().is_err());

        let book = CreateBook { file_url: Some("https://cdn.academy.kr/book.pdf".into()), ..book };
        assert!(book.validate().is_ok());
    }
}
