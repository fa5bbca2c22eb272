//! User Repository

use chrono::Utc;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Role, SignupRequest, User};

/// Backdate applied to `password_changed_at` at signup so a token issued
/// in the same second as the account is not rejected as stale
const PASSWORD_CHANGED_SKEW_MS: i64 = 1_000;

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all users, newest first
    pub async fn find_all(&self) -> RepoResult<Vec<User>> {
        let users: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user ORDER BY created_at DESC")
            .await?
            .take(0)?;
        Ok(users)
    }

    /// Find user by id; malformed ids read as missing
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<User>> {
        let record: RecordId = match id.parse() {
            Ok(record) => record,
            Err(_) => return Ok(None),
        };
        let user: Option<User> = self.base.db().select(record).await?;
        Ok(user)
    }

    /// Find user by username
    pub async fn find_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let username_owned = username.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE username = $username LIMIT 1")
            .bind(("username", username_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email_owned = email.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Find the account matching a login request by username or email
    ///
    /// 用户名和邮箱都允许登录, 两者缺省时绑定空串, 不会误中任何记录。
    pub async fn find_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> RepoResult<Option<User>> {
        let username_owned = username.unwrap_or_default().to_string();
        let email_owned = email.unwrap_or_default().to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM user WHERE username = $username OR email = $email LIMIT 1")
            .bind(("username", username_owned))
            .bind(("email", email_owned))
            .await?;
        let users: Vec<User> = result.take(0)?;
        Ok(users.into_iter().next())
    }

    /// Create a new user account
    ///
    /// The caller has already validated the payload; this only guards
    /// uniqueness and hashes the password. New accounts always get the
    /// `user` role.
    pub async fn create(&self, data: SignupRequest) -> RepoResult<User> {
        // Check duplicate username
        if self.find_by_username(&data.username).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Username '{}' is already taken",
                data.username
            )));
        }

        // Check duplicate email
        if self.find_by_email(&data.email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Email '{}' is already registered",
                data.email
            )));
        }

        // Hash password
        let password = User::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        let now = Utc::now().timestamp_millis();

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE user SET
                    name = $name,
                    username = $username,
                    email = $email,
                    password = $password,
                    role = $role,
                    password_changed_at = $password_changed_at,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("name", data.name))
            .bind(("username", data.username))
            .bind(("email", data.email))
            .bind(("password", password))
            .bind(("role", Role::User))
            .bind(("password_changed_at", now - PASSWORD_CHANGED_SKEW_MS))
            .bind(("created_at", now))
            .await?;

        let created: Option<User> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }
}
