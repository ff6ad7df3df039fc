/// Shared domain enums used across the codebase
///
/// Every enum is stored as TEXT in PostgreSQL (guarded by CHECK constraints)
/// and serialized in snake_case on the wire.
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

text_enum! {
    /// Portal role of a user account
    Role {
        Teacher => "teacher",
        Admin => "admin",
        SuperAdmin => "super_admin",
    }
}

impl Role {
    /// Admins and super admins share the back-office permissions
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

text_enum! {
    UserStatus {
        Active => "active",
        Inactive => "inactive",
    }
}

text_enum! {
    StudentStatus {
        Active => "active",
        Paused => "paused",
        Inactive => "inactive",
    }
}

text_enum! {
    /// Korean-Manager / Chinese-Manager routing of a student
    Manager {
        Km => "km",
        Cm => "cm",
    }
}

text_enum! {
    /// Where a lesson takes place
    Platform {
        Zoom => "zoom",
        ClassIn => "classin",
        Skype => "skype",
        GoogleMeet => "google_meet",
        Other => "other",
    }
}

text_enum! {
    ClassKind {
        Single => "single",
        Recurring => "recurring",
        Makeup => "makeup",
    }
}

text_enum! {
    ClassStatus {
        Scheduled => "scheduled",
        Completed => "completed",
        Cancelled => "cancelled",
        Missed => "missed",
    }
}

text_enum! {
    AttendanceStatus {
        Present => "present",
        Absent => "absent",
        Late => "late",
        Excused => "excused",
    }
}

text_enum! {
    PayoutStatus {
        Pending => "pending",
        Paid => "paid",
        Cancelled => "cancelled",
    }
}

text_enum! {
    ApplicationStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

text_enum! {
    /// Uploaded class media
    MediaKind {
        Recording => "recording",
        Screenshot => "screenshot",
    }
}

impl MediaKind {
    /// Table holding rows of this kind
    pub fn table(&self) -> &'static str {
        match self {
            MediaKind::Recording => "recordings",
            MediaKind::Screenshot => "screenshots",
        }
    }

    /// Subdirectory under the uploads root
    pub fn directory(&self) -> &'static str {
        self.table()
    }

    /// Accepted MIME type family
    pub fn accepts(&self, content_type: &str) -> bool {
        match self {
            MediaKind::Recording => content_type.starts_with("video/"),
            MediaKind::Screenshot => content_type.starts_with("image/"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_snake_case() {
        assert_eq!("super_admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!(Platform::GoogleMeet.to_string(), "google_meet");
        assert_eq!(serde_json::to_value(Manager::Km).unwrap(), "km");
    }

    #[test]
    fn rejects_unknown_values() {
        let err = "owner".parse::<Role>().unwrap_err();
        assert_eq!(err.kind, "Role");
        assert!(ClassKind::try_from("weekly".to_string()).is_err());
    }

    #[test]
    fn staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::SuperAdmin.is_staff());
        assert!(!Role::Teacher.is_staff());
    }

    #[test]
    fn media_kinds_accept_their_family() {
        assert!(MediaKind::Recording.accepts("video/mp4"));
        assert!(!MediaKind::Recording.accepts("image/png"));
        assert!(MediaKind::Screenshot.accepts("image/png"));
        assert_eq!(MediaKind::Screenshot.directory(), "screenshots");
    }
}
