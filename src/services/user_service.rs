use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{NewUser, User, UserChanges, UserSummary, UserWithRoles};
use crate::database::DatabaseError;

const USER_COLUMNS: &str = "id, name, email, password, cpf, created_at, updated_at";

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_cpf(&self, cpf: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE cpf = $1"))
            .bind(cpf)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Access level names held by the user
    pub async fn roles_of(&self, user_id: Uuid) -> Result<Vec<String>, DatabaseError> {
        let roles: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT al.name
            FROM access_levels al
            JOIN user_access_levels ual ON ual.access_level_id = al.id
            WHERE ual.user_id = $1
            ORDER BY al.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(roles.into_iter().map(|(name,)| name).collect())
    }

    /// Insert the user and link the access level in one statement
    pub async fn create(&self, new_user: NewUser, access_level_id: Uuid) -> Result<UserSummary, DatabaseError> {
        let user = sqlx::query_as::<_, UserSummary>(
            r#"
            WITH inserted AS (
                INSERT INTO users (id, name, email, password, cpf)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, name, email
            ), linked AS (
                INSERT INTO user_access_levels (user_id, access_level_id)
                SELECT id, $6 FROM inserted
            )
            SELECT id, name, email FROM inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.cpf)
        .bind(access_level_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn list_with_roles(&self) -> Result<Vec<UserWithRoles>, DatabaseError> {
        let users = sqlx::query_as::<_, UserWithRoles>(
            r#"
            SELECT u.id, u.name, u.email, u.cpf,
                   COALESCE(array_agg(al.name ORDER BY al.name) FILTER (WHERE al.name IS NOT NULL), '{}') AS access_levels
            FROM users u
            LEFT JOIN user_access_levels ual ON ual.user_id = u.id
            LEFT JOIN access_levels al ON al.id = ual.access_level_id
            GROUP BY u.id
            ORDER BY u.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Apply a partial update, returning the updated row if the user exists
    pub async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                cpf = COALESCE($4, cpf),
                password = COALESCE($5, password),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.cpf)
        .bind(changes.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Returns false when no such user existed
    pub async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
