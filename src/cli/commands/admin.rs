use anyhow::anyhow;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::{utils, OutputFormat};
use crate::config;
use crate::database::models::user::RegisterUser;
use crate::services::{NewUser, UserService};
use crate::types::Role;

/// Bootstraps the first account; later accounts go through POST /auth/register
pub async fn create_super_admin(
    name: String,
    email: String,
    password: String,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let input = RegisterUser {
        name,
        email,
        password,
        role: Role::SuperAdmin,
        phone: None,
        hourly_rate: None,
    };
    input.validate().map_err(|e| anyhow!("{}", e.to_json()))?;

    let config = config::config();
    let pool = super::connect(config).await?;
    let users = UserService::new(pool);

    let email = input.normalized_email();
    if users.find_by_email(&email).await?.is_some() {
        return Err(anyhow!("A user with email '{}' already exists", email));
    }

    let password_hash = hash_password(input.password, config.security.bcrypt_cost).await?;
    let user = users
        .create(NewUser {
            name: &input.name,
            email: &email,
            password_hash,
            role: Role::SuperAdmin,
            phone: None,
            hourly_rate: None,
        })
        .await?;

    utils::output_success(
        &output_format,
        &format!("Created super admin '{}'", user.email),
        Some(json!({ "id": user.id, "email": user.email, "role": user.role })),
    )
}
