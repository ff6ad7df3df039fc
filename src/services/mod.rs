// Per-resource data access over the shared PgPool

pub mod application_service;
pub mod attendance_service;
pub mod book_assign_service;
pub mod book_service;
pub mod class_service;
pub mod dashboard_service;
pub mod media_service;
pub mod message_service;
pub mod notification_service;
pub mod payout_service;
pub mod schedule_service;
pub mod student_service;
pub mod user_service;

pub use application_service::ApplicationService;
pub use attendance_service::AttendanceService;
pub use book_assign_service::BookAssignService;
pub use book_service::BookService;
pub use class_service::ClassService;
pub use dashboard_service::{Dashboard, DashboardService};
pub use media_service::MediaService;
pub use message_service::MessageService;
pub use notification_service::NotificationService;
pub use payout_service::PayoutService;
pub use schedule_service::ScheduleService;
pub use student_service::StudentService;
pub use user_service::{NewUser, UserService};
