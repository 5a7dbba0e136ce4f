use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::user::{NewUser, Profile, ProfileUpdate, User},
    repositories::{conflict_on_unique, UserRepository},
};

const USER_COLUMNS: &str = "id, name, email, password_hash, bio, profile_photo, education, work, created_at, updated_at";

/// A helper function to map a `tokio_postgres::Row` to a `User`.
fn row_to_user(row: &Row) -> Result<User> {
    Ok(User {
        id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
        name: row.try_get("name").map_err(|_| AppError::MissingData("name".to_string()))?,
        email: row.try_get("email").map_err(|_| AppError::MissingData("email".to_string()))?,
        password_hash: row.try_get("password_hash").map_err(|_| AppError::MissingData("password_hash".to_string()))?,
        profile: Profile {
            bio: row.try_get("bio").map_err(|_| AppError::MissingData("bio".to_string()))?,
            photo_ref: row.try_get("profile_photo").map_err(|_| AppError::MissingData("profile_photo".to_string()))?,
            education: row.try_get("education").map_err(|_| AppError::MissingData("education".to_string()))?,
            work: row.try_get("work").map_err(|_| AppError::MissingData("work".to_string()))?,
        },
        created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
        updated_at: row.try_get("updated_at").map_err(|_| AppError::MissingData("updated_at".to_string()))?,
    })
}

/// Users stored in the `users` table.
#[derive(Clone)]
pub struct PgUserRepository {
    pool: Pool,
}

impl PgUserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: NewUser) -> Result<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                &format!(
                    r#"
                    INSERT INTO users (id, name, email, password_hash)
                    VALUES ($1, $2, $3, $4)
                    RETURNING {USER_COLUMNS}
                    "#
                ),
                &[&Uuid::new_v4(), &user.name, &user.email, &user.password_hash],
            )
            .await
            .map_err(|e| conflict_on_unique(e, "User already exists"))?;
        row_to_user(&row)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"),
                &[&email],
            )
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"),
                &[&id],
            )
            .await?;
        row.map(|r| row_to_user(&r)).transpose()
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!(
                    r#"
                    UPDATE users
                    SET
                        name = COALESCE($2, name),
                        bio = COALESCE($3, bio),
                        education = COALESCE($4, education),
                        work = COALESCE($5, work),
                        profile_photo = COALESCE($6, profile_photo),
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {USER_COLUMNS}
                    "#
                ),
                &[
                    &id,
                    &update.name,
                    &update.bio,
                    &update.education,
                    &update.work,
                    &update.photo_ref,
                ],
            )
            .await
            .map_err(|e| conflict_on_unique(e, "Name is already taken"))?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        row_to_user(&row)
    }
}
