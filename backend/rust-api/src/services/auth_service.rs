use anyhow::Context;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use std::sync::Arc;
use validator::{Validate, ValidationErrors};

use super::{store::UserStore, ServiceError, ServiceResult};
use crate::middlewares::auth::{JwtClaims, JwtService};
use crate::models::user::{CreateUserRequest, LoginResponse, User, UserProfile};

/// Flatten validator output into `"field: message"` strings, sorted by field.
pub fn validation_messages(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{} is invalid", field),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    jwt_service: JwtService,
    token_ttl_minutes: i64,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, jwt_service: JwtService, token_ttl_minutes: i64) -> Self {
        Self {
            users,
            jwt_service,
            token_ttl_minutes,
        }
    }

    /// Hash a password using bcrypt with the default cost
    pub fn hash_password(password: &str) -> anyhow::Result<String> {
        hash(password, DEFAULT_COST).context("Failed to hash password")
    }

    /// Register a new, non-admin user
    pub async fn create_user(&self, req: CreateUserRequest) -> ServiceResult<UserProfile> {
        let req = req.trimmed();
        if let Err(e) = req.validate() {
            return Err(ServiceError::InvalidFields(validation_messages(&e)));
        }

        if self.users.find_by_username(&req.username).await?.is_some() {
            return Err(ServiceError::Conflict("User already exists".to_string()));
        }

        let mut user = User {
            id: None,
            first_name: req.first_name,
            last_name: req.last_name,
            username: req.username,
            password_hash: Self::hash_password(&req.password)?,
            is_admin: false,
            created_at: Utc::now(),
        };

        let id = self.users.insert(&user).await?;
        user.id = Some(id);
        tracing::info!("User created: {}", user.username);

        Ok(UserProfile::from(user))
    }

    /// Check credentials and issue a bearer token
    pub async fn login(&self, username: &str, password: &str) -> ServiceResult<LoginResponse> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| {
                tracing::warn!("Login failed: unknown user {}", username);
                ServiceError::Unauthorized(
                    "Unable to find user with this specific username".to_string(),
                )
            })?;

        let valid = verify(password, &user.password_hash).unwrap_or_else(|e| {
            tracing::warn!("Unable to validate password for {}: {}", username, e);
            false
        });
        if !valid {
            tracing::warn!("Login failed: wrong password for {}", username);
            return Err(ServiceError::Unauthorized(
                "User password is wrong. Check again".to_string(),
            ));
        }

        let now = Utc::now();
        let claims = JwtClaims {
            sub: user.username.clone(),
            is_admin: user.is_admin,
            exp: (now + Duration::minutes(self.token_ttl_minutes)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        let token = self
            .jwt_service
            .generate_token(claims)
            .context("Failed to sign token")?;

        tracing::info!("User {} logged in", user.username);

        Ok(LoginResponse {
            user: UserProfile::from(user),
            token,
        })
    }
}
