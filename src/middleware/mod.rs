pub mod auth;
pub mod authorize;
pub mod extract;
pub mod response;

pub use auth::{extract_token, jwt_auth_middleware, AuthUser};
pub use authorize::{authorize, AnyUser, Authorized, Policy, StaffUser, SuperAdminUser};
pub use extract::{JsonBody, PathParam, QueryParams};
pub use response::{ApiResponse, ApiResult};
