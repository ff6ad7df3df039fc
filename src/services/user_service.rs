use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::database::models::user::{UpdateUser, User, UserFilter, UserProfile};
use crate::database::models::normalize_email;
use crate::database::pagination::{like_pattern, Paged, Pagination};
use crate::database::DatabaseError;
use crate::types::{Role, UserStatus};

/// Fields for a new account; the password is already hashed
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: String,
    pub role: Role,
    pub phone: Option<String>,
    pub hourly_rate: Option<rust_decimal::Decimal>,
}

/// Accounts for every role: teachers, admins and super admins
#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get(&self, id: Uuid) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))
    }

    /// Looks up a user and requires one of `roles`; other roles read as missing
    pub async fn get_with_role(&self, id: Uuid, roles: &[Role]) -> Result<User, DatabaseError> {
        let user = self.get(id).await?;
        if roles.contains(&user.role) {
            Ok(user)
        } else {
            Err(DatabaseError::NotFound(format!("User {} not found", id)))
        }
    }

    pub async fn create(&self, new: NewUser<'_>) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, name, email, password_hash, role, phone, hourly_rate) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(new.name.trim())
        .bind(normalize_email(new.email))
        .bind(new.password_hash)
        .bind(new.role.as_str())
        .bind(new.phone)
        .bind(new.hourly_rate)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "Created user");
        Ok(user)
    }

    pub async fn list(
        &self,
        roles: &[Role],
        filter: &UserFilter,
        page: Pagination,
    ) -> Result<Paged<UserProfile>, DatabaseError> {
        let role_names: Vec<String> = roles.iter().map(|r| r.as_str().to_string()).collect();

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filters(&mut count, &role_names, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM users");
        push_filters(&mut query, &role_names, filter);
        query
            .push(" ORDER BY name ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let users = query.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok(page.page_of(users.into_iter().map(UserProfile::from).collect(), total))
    }

    pub async fn update(&self, id: Uuid, patch: UpdateUser) -> Result<User, DatabaseError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = now()");
        if let Some(name) = patch.name {
            query.push(", name = ").push_bind(name.trim().to_string());
        }
        if let Some(email) = patch.email {
            query.push(", email = ").push_bind(normalize_email(&email));
        }
        if let Some(phone) = patch.phone {
            query.push(", phone = ").push_bind(phone);
        }
        if let Some(rate) = patch.hourly_rate {
            query.push(", hourly_rate = ").push_bind(rate);
        }
        if let Some(status) = patch.status {
            query.push(", status = ").push_bind(status.as_str());
        }
        query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        query
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))
    }

    pub async fn set_password(&self, id: Uuid, password_hash: String) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {} not found", id)));
        }
        tracing::info!(user_id = %id, "Deleted user");
        Ok(())
    }

    /// Active users holding `role`, for role-wide notifications
    pub async fn active_ids_with_role(&self, role: Role) -> Result<Vec<Uuid>, DatabaseError> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE role = $1 AND status = $2")
            .bind(role.as_str())
            .bind(UserStatus::Active.as_str())
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, roles: &[String], filter: &UserFilter) {
    query.push(" WHERE role = ANY(").push_bind(roles.to_vec()).push(")");
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        query
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}
