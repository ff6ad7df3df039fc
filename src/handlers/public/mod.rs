// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Security Level: None
// Route Prefix: /api/v1/auth/{login,refresh,logout}, POST /api/v1/applications,
//               plus the root and health probes

pub mod applications;
pub mod auth;
pub mod system;
