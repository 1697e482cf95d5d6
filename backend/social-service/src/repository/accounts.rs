use super::traits::{AccountStore, StoreResult};
use crate::domain::models::{Account, AccountSet};
use sqlx::PgPool;
use uuid::Uuid;

const ACCOUNT_COLUMNS: &str = "id, username, full_name, email, password_hash, profile_img, \
     cover_img, bio, link, followers, following, liked_posts, created_at, updated_at";

/// PostgreSQL-backed Account Directory
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {column} = $1");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }
}

/// Escape LIKE metacharacters so user input is matched literally
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

#[async_trait::async_trait]
impl AccountStore for PgAccountRepository {
    async fn insert(&self, account: &Account) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, username, full_name, email, password_hash, profile_img, cover_img,
                bio, link, followers, following, liked_posts, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.full_name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.profile_img)
        .bind(&account.cover_img)
        .bind(&account.bio)
        .bind(&account.link)
        .bind(&account.followers)
        .bind(&account.following)
        .bind(&account.liked_posts)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(account)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        self.find_one("username", username).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.find_one("email", email).await
    }

    async fn find_many(&self, ids: &[Uuid]) -> StoreResult<Vec<Account>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ANY($1)");
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(accounts)
    }

    async fn add_to_set(&self, id: Uuid, set: AccountSet, member: Uuid) -> StoreResult<bool> {
        // Single-statement add-if-absent; the row matches whenever the account exists
        let column = set.column();
        let sql = format!(
            "UPDATE accounts \
             SET {column} = CASE WHEN $2 = ANY({column}) THEN {column} \
                                 ELSE array_append({column}, $2) END, \
                 updated_at = NOW() \
             WHERE id = $1"
        );
        let affected = sqlx::query(&sql)
            .bind(id)
            .bind(member)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn remove_from_set(&self, id: Uuid, set: AccountSet, member: Uuid) -> StoreResult<bool> {
        let column = set.column();
        let sql = format!(
            "UPDATE accounts SET {column} = array_remove({column}, $2), updated_at = NOW() \
             WHERE id = $1"
        );
        let affected = sqlx::query(&sql)
            .bind(id)
            .bind(member)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn save_profile(&self, account: &Account) -> StoreResult<bool> {
        let affected = sqlx::query(
            r#"
            UPDATE accounts
            SET username = $2, full_name = $3, email = $4, password_hash = $5,
                profile_img = $6, cover_img = $7, bio = $8, link = $9, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(account.id)
        .bind(&account.username)
        .bind(&account.full_name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.profile_img)
        .bind(&account.cover_img)
        .bind(&account.bio)
        .bind(&account.link)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn search(&self, query: &str) -> StoreResult<Vec<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts \
             WHERE username ILIKE $1 OR email ILIKE $1 OR full_name ILIKE $1 \
             ORDER BY full_name"
        );
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(like_pattern(query))
            .fetch_all(&self.pool)
            .await?;
        Ok(accounts)
    }

    async fn list_except(&self, id: Uuid) -> StoreResult<Vec<Account>> {
        let sql =
            format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id <> $1 ORDER BY full_name");
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        Ok(accounts)
    }

    async fn sample_except(&self, id: Uuid, limit: usize) -> StoreResult<Vec<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id <> $1 ORDER BY random() LIMIT $2"
        );
        let accounts = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(accounts)
    }
}
