pub mod application;
pub mod attendance;
pub mod book;
pub mod book_assign;
pub mod class;
pub mod media;
pub mod message;
pub mod notification;
pub mod payout;
pub mod schedule;
pub mod student;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
/// in PATCH bodies
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Loose shape check; delivery is the real verification
pub fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trimmed text, with blank strings treated as absent
pub fn clean(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use uuid::Uuid;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        teacher_id: Option<Option<Uuid>>,
    }

    #[test]
    fn double_option_separates_null_from_missing() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.teacher_id, None);

        let null: Patch = serde_json::from_str(r#"{"teacher_id": null}"#).unwrap();
        assert_eq!(null.teacher_id, Some(None));

        let id = Uuid::new_v4();
        let set: Patch = serde_json::from_str(&format!(r#"{{"teacher_id": "{}"}}"#, id)).unwrap();
        assert_eq!(set.teacher_id, Some(Some(id)));
    }

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("teacher@academy.kr"));
        assert!(!looks_like_email("teacher@academy"));
        assert!(!looks_like_email("@academy.kr"));
        assert!(!looks_like_email("a b@academy.kr"));
        assert_eq!(normalize_email("  Ann@Academy.KR "), "ann@academy.kr");
    }

    #[test]
    fn clean_drops_blank_text() {
        assert_eq!(clean(Some("  ".to_string())), None);
        assert_eq!(clean(Some(" x ".to_string())), Some("x".to_string()));
    }
}
