//! User service.
//!
//! Accounts mirror an external identity provider; this service only
//! resolves tokens, keeps profile fields, and feeds the admin surface.

use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use academy_common::{AppError, AppResult, IdGenerator};
use academy_db::entities::user;
use academy_db::repositories::UserRepository;

use crate::services::activity_log::{ActivityLogService, ActivityType, NewActivity};

pub use academy_db::entities::user::UserRole;

/// Input for registering a user.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    pub region: Option<String>,
    pub country: Option<String>,
    pub school_level: Option<String>,
    pub department: Option<String>,
}

/// Input for updating profile fields.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 256))]
    pub name: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub school_level: Option<String>,
    pub department: Option<String>,
}

/// Service for user accounts and profiles.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    activity_log: ActivityLogService,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, activity_log: ActivityLogService) -> Self {
        Self {
            user_repo,
            activity_log,
            id_gen: IdGenerator::new(),
        }
    }

    /// Resolve a bearer token to a user.
    pub async fn authenticate_by_token(&self, token: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_token(token)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Register a user mirrored from the identity provider.
    pub async fn register(&self, input: RegisterUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "email {} already registered",
                input.email
            )));
        }

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name.clone()),
            email: Set(input.email.clone()),
            token: Set(Some(self.id_gen.generate_token())),
            role: Set(UserRole::User),
            region: Set(input.region),
            country: Set(input.country),
            school_level: Set(input.school_level),
            department: Set(input.department),
            created_at: Set(chrono::Utc::now().into()),
            last_login: Set(None),
        };

        let created = self.user_repo.create(model).await?;

        self.activity_log
            .record(
                NewActivity::new(
                    ActivityType::UserRegistered,
                    format!("User registered: {}", input.email),
                )
                .user(&created.id),
            )
            .await?;

        Ok(created)
    }

    /// Record a login.
    pub async fn record_login(&self, user: &user::Model) -> AppResult<()> {
        self.user_repo.touch_last_login(&user.id).await?;

        self.activity_log
            .record(
                NewActivity::new(
                    ActivityType::UserLogin,
                    format!("User logged in: {}", user.email),
                )
                .user(&user.id),
            )
            .await?;

        Ok(())
    }

    /// Update profile fields. A call that changes nothing appends no log
    /// entry.
    pub async fn update_profile(
        &self,
        user: &user::Model,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let mut active: user::ActiveModel = user.clone().into();
        let mut changed = false;

        if let Some(name) = input.name.filter(|n| n != &user.name) {
            active.name = Set(name);
            changed = true;
        }
        if let Some(region) = input.region.filter(|v| user.region.as_ref() != Some(v)) {
            active.region = Set(Some(region));
            changed = true;
        }
        if let Some(country) = input.country.filter(|v| user.country.as_ref() != Some(v)) {
            active.country = Set(Some(country));
            changed = true;
        }
        if let Some(level) = input
            .school_level
            .filter(|v| user.school_level.as_ref() != Some(v))
        {
            active.school_level = Set(Some(level));
            changed = true;
        }
        if let Some(dept) = input
            .department
            .filter(|v| user.department.as_ref() != Some(v))
        {
            active.department = Set(Some(dept));
            changed = true;
        }

        if !changed {
            return Ok(user.clone());
        }

        let updated = self.user_repo.update(active).await?;

        self.activity_log
            .record(
                NewActivity::new(
                    ActivityType::UserUpdated,
                    format!("Profile updated: {}", user.email),
                )
                .user(&user.id),
            )
            .await?;

        Ok(updated)
    }

    /// Fetch a user by id.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Admin listing of users, newest first.
    pub async fn list(
        &self,
        actor: &user::Model,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<user::Model>> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden("admin only".to_string()));
        }
        self.user_repo.list(limit, offset).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use academy_db::repositories::ActivityLogRepository;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: Arc<sea_orm::DatabaseConnection>) -> UserService {
        UserService::new(
            UserRepository::new(Arc::clone(&db)),
            ActivityLogService::new(ActivityLogRepository::new(db)),
        )
    }

    fn test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            token: Some("token-1".to_string()),
            role: UserRole::User,
            region: Some("Europe".to_string()),
            country: None,
            school_level: None,
            department: None,
            created_at: Utc::now().into(),
            last_login: None,
        }
    }

    #[tokio::test]
    async fn authenticate_unknown_token_is_unauthorized() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let result = service(db).authenticate_by_token("nope").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn register_duplicate_email_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_user("existing")]])
                .into_connection(),
        );

        let result = service(db)
            .register(RegisterUserInput {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
                region: None,
                country: None,
                school_level: None,
                department: None,
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn update_profile_without_changes_is_noop() {
        // No query results at all: an unchanged profile must not hit the
        // database or append a log entry
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let user = test_user("user1");
        let result = service(db)
            .update_profile(
                &user,
                UpdateProfileInput {
                    region: Some("Europe".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(result.id, user.id);
    }

    #[test]
    fn register_input_validates_email() {
        let input = RegisterUserInput {
            name: "Alice".to_string(),
            email: "not-an-email".to_string(),
            region: None,
            country: None,
            school_level: None,
            department: None,
        };

        assert!(input.validate().is_err());
    }
}
