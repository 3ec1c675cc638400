use anyhow::{Context, Result};
use chrono::Utc;

use super::{auth_service::AuthService, store::UserStore};
use crate::config::AdminSeed;
use crate::models::User;

/// Insert the configured administrator unless an account with that
/// username already exists. Existing accounts are left untouched.
pub async fn bootstrap(seed: &AdminSeed, users: &dyn UserStore) -> Result<()> {
    let username = seed.username.trim();
    tracing::debug!("Checking for admin account {}", username);

    if users
        .find_by_username(username)
        .await
        .context("Failed to look up admin account")?
        .is_some()
    {
        tracing::info!("Admin {} already exists, seed skipped", username);
        return Ok(());
    }

    let admin = User {
        id: None,
        first_name: "Quiz".to_string(),
        last_name: "Admin".to_string(),
        username: username.to_string(),
        password_hash: AuthService::hash_password(&seed.password)
            .context("Failed to hash admin password")?,
        is_admin: true,
        created_at: Utc::now(),
    };

    users
        .insert(&admin)
        .await
        .context("Failed to insert admin account")?;
    tracing::info!("Admin account {} bootstrapped", username);

    Ok(())
}
