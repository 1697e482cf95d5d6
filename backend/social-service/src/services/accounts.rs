//! Account Directory: signup, credential checks, profiles and discovery.
use super::media::{destroy_quietly, ImageSource, ImageStore, UploadOptions};
use super::Stores;
use crate::domain::models::{Account, ProfileUpdate};
use crate::error::{AppError, Result};
use crate::repository::StoreError;
use crate::security::password::{hash_password, validate_password_length, verify_password};
use crate::security::validators::{
    into_app_error, normalize_email, validate_email, validate_username,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Candidates drawn before filtering out accounts the actor already follows
const SUGGESTION_SAMPLE: usize = 10;
const SUGGESTION_LIMIT: usize = 4;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupInput {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

fn taken(err: StoreError) -> AppError {
    match err {
        StoreError::Conflict(constraint) if constraint == "accounts_username_key" => {
            AppError::Validation("Username is already taken".into())
        }
        StoreError::Conflict(constraint) if constraint == "accounts_email_key" => {
            AppError::Validation("Email is already taken".into())
        }
        other => other.into(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Clone)]
pub struct AccountService {
    stores: Stores,
    images: Arc<dyn ImageStore>,
}

impl AccountService {
    pub fn new(stores: Stores, images: Arc<dyn ImageStore>) -> Self {
        Self { stores, images }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let account = self
            .stores
            .call("accounts.find_by_username", || {
                self.stores.accounts.find_by_username(username)
            })
            .await?;
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        let account = self
            .stores
            .call("accounts.find_by_email", || {
                self.stores.accounts.find_by_email(email)
            })
            .await?;
        Ok(account)
    }

    pub async fn signup(&self, input: SignupInput) -> Result<Account> {
        input.validate().map_err(into_app_error)?;

        let username = input.username.trim().to_string();
        let email = normalize_email(&input.email);
        validate_email(&email)?;
        validate_username(&username)?;
        validate_password_length(&input.password)?;

        if self.find_by_username(&username).await?.is_some() {
            return Err(AppError::Validation("Username is already taken".into()));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::Validation("Email is already taken".into()));
        }

        let password_hash = hash_password(&input.password)?;
        let account = Account::new(
            username,
            input.full_name.trim().to_string(),
            email,
            password_hash,
        );

        // Uniqueness races between the checks above and the insert surface as conflicts
        self.stores
            .call("accounts.insert", || self.stores.accounts.insert(&account))
            .await
            .map_err(taken)?;

        info!(account_id = %account.id, username = %account.username, "Account created");
        Ok(account)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Account> {
        let account = self
            .find_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        if !verify_password(password, &account.password_hash)? {
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
        Ok(account)
    }

    pub async fn get(&self, id: Uuid) -> Result<Account> {
        self.stores.require_account(id).await
    }

    pub async fn profile(&self, username: &str) -> Result<Account> {
        self.find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// A few accounts the actor does not follow yet
    pub async fn suggested(&self, actor: Uuid) -> Result<Vec<Account>> {
        let account = self.stores.require_account(actor).await?;
        let sample = self
            .stores
            .call("accounts.sample_except", || {
                self.stores.accounts.sample_except(actor, SUGGESTION_SAMPLE)
            })
            .await?;
        Ok(sample
            .into_iter()
            .filter(|candidate| !account.is_following(candidate.id))
            .take(SUGGESTION_LIMIT)
            .collect())
    }

    /// Case-insensitive substring match over usernames and full names
    pub async fn search(&self, query: &str) -> Result<Vec<Account>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Validation("Query parameter is required".into()));
        }
        let accounts = self
            .stores
            .call("accounts.search", || self.stores.accounts.search(query))
            .await?;
        Ok(accounts)
    }

    /// Every account other than the actor
    pub async fn list_all(&self, actor: Uuid) -> Result<Vec<Account>> {
        let accounts = self
            .stores
            .call("accounts.list_except", || {
                self.stores.accounts.list_except(actor)
            })
            .await?;
        Ok(accounts)
    }

    /// Apply a self-service profile change. Blank fields keep their current value.
    pub async fn update_profile(&self, actor: Uuid, update: ProfileUpdate) -> Result<Account> {
        let mut account = self.stores.require_account(actor).await?;

        match (
            non_blank(update.current_password),
            non_blank(update.new_password),
        ) {
            (None, None) => {}
            (Some(current), Some(new)) => {
                if !verify_password(&current, &account.password_hash)? {
                    return Err(AppError::Validation("Current password is incorrect".into()));
                }
                account.password_hash = hash_password(&new)?;
            }
            _ => {
                return Err(AppError::Validation(
                    "Please provide both current password and new password".into(),
                ));
            }
        }

        if let Some(username) = non_blank(update.username) {
            let username = username.trim().to_string();
            if username != account.username {
                validate_username(&username)?;
                if self.find_by_username(&username).await?.is_some() {
                    return Err(AppError::Validation("Username is already taken".into()));
                }
                account.username = username;
            }
        }
        if let Some(email) = non_blank(update.email) {
            let email = normalize_email(&email);
            if email != account.email {
                validate_email(&email)?;
                if self.find_by_email(&email).await?.is_some() {
                    return Err(AppError::Validation("Email is already taken".into()));
                }
                account.email = email;
            }
        }
        if let Some(full_name) = non_blank(update.full_name) {
            account.full_name = full_name.trim().to_string();
        }
        if let Some(bio) = non_blank(update.bio) {
            account.bio = bio;
        }
        if let Some(link) = non_blank(update.link) {
            account.link = link;
        }

        let mut replaced = Vec::new();
        if let Some(encoded) = non_blank(update.profile_img) {
            let url = self
                .images
                .upload(ImageSource::Encoded(encoded), &UploadOptions::default())
                .await?;
            replaced.extend(account.profile_img.replace(url));
        }
        if let Some(encoded) = non_blank(update.cover_img) {
            let url = self
                .images
                .upload(ImageSource::Encoded(encoded), &UploadOptions::default())
                .await?;
            replaced.extend(account.cover_img.replace(url));
        }

        self.save(&account).await?;
        for old in &replaced {
            destroy_quietly(self.images.as_ref(), old).await;
        }

        info!(account_id = %actor, "Profile updated");
        Ok(account)
    }

    /// Upload a new avatar (400x400 fill crop) and drop the previous one
    pub async fn update_profile_picture(&self, actor: Uuid, image: ImageSource) -> Result<Account> {
        if !self.images.is_configured() {
            return Err(AppError::UpstreamService(
                "Image upload service is not configured properly".into(),
            ));
        }

        let mut account = self.stores.require_account(actor).await?;
        let url = self
            .images
            .upload(image, &UploadOptions::profile_picture())
            .await?;
        let previous = account.profile_img.replace(url);

        self.save(&account).await?;
        if let Some(old) = previous {
            destroy_quietly(self.images.as_ref(), &old).await;
        }

        info!(account_id = %actor, "Profile picture updated");
        Ok(account)
    }

    async fn save(&self, account: &Account) -> Result<()> {
        let saved = self
            .stores
            .call("accounts.save_profile", || {
                self.stores.accounts.save_profile(account)
            })
            .await
            .map_err(taken)?;
        if !saved {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }
}
