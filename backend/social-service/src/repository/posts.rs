use super::traits::{PostStore, StoreResult};
use crate::domain::models::{Comment, Post};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    text: Option<String>,
    img: Option<String>,
    likes: Vec<Uuid>,
    is_reshare: bool,
    original_post: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CommentRow {
    post_id: Uuid,
    id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

const POST_COLUMNS: &str =
    "id, author_id, text, img, likes, is_reshare, original_post, created_at, updated_at";

/// PostgreSQL-backed Content Store
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Attach comments (in insertion order) to a batch of post rows
    async fn assemble(&self, rows: Vec<PostRow>) -> StoreResult<Vec<Post>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let comment_rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT post_id, id, author_id, text, created_at
            FROM post_comments
            WHERE post_id = ANY($1)
            ORDER BY seq ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut comments: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            comments.entry(row.post_id).or_default().push(Comment {
                id: row.id,
                author_id: row.author_id,
                text: row.text,
                created_at: row.created_at,
            });
        }

        Ok(rows
            .into_iter()
            .map(|row| Post {
                comments: comments.remove(&row.id).unwrap_or_default(),
                id: row.id,
                author_id: row.author_id,
                text: row.text,
                img: row.img,
                likes: row.likes,
                is_reshare: row.is_reshare,
                original_post: row.original_post,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl PostStore for PgPostRepository {
    async fn insert(&self, post: &Post) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (
                id, author_id, text, img, likes, is_reshare, original_post, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(post.id)
        .bind(post.author_id)
        .bind(&post.text)
        .bind(&post.img)
        .bind(&post.likes)
        .bind(post.is_reshare)
        .bind(post.original_post)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> StoreResult<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> StoreResult<Vec<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY created_at DESC, seq DESC");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        self.assemble(rows).await
    }

    async fn list_by_authors(&self, authors: &[Uuid]) -> StoreResult<Vec<Post>> {
        if authors.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE author_id = ANY($1) \
             ORDER BY created_at DESC, seq DESC"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(authors)
            .fetch_all(&self.pool)
            .await?;
        self.assemble(rows).await
    }

    async fn list_liked_by(&self, account_id: Uuid) -> StoreResult<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE $1 = ANY(likes) \
             ORDER BY created_at DESC, seq DESC"
        );
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .bind(account_id)
            .fetch_all(&self.pool)
            .await?;
        self.assemble(rows).await
    }

    async fn add_like(&self, post_id: Uuid, account_id: Uuid) -> StoreResult<bool> {
        let affected = sqlx::query(
            r#"
            UPDATE posts
            SET likes = CASE WHEN $2 = ANY(likes) THEN likes ELSE array_append(likes, $2) END
            WHERE id = $1
            "#,
        )
        .bind(post_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn remove_like(&self, post_id: Uuid, account_id: Uuid) -> StoreResult<bool> {
        let affected = sqlx::query("UPDATE posts SET likes = array_remove(likes, $2) WHERE id = $1")
            .bind(post_id)
            .bind(account_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn push_comment(&self, post_id: Uuid, comment: &Comment) -> StoreResult<bool> {
        // The FK makes a missing post fail the insert; check first so that
        // case is reported as absence rather than a backend error.
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO post_comments (post_id, id, author_id, text, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (post_id, id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(comment.id)
        .bind(comment.author_id)
        .bind(&comment.text)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(true)
    }

    async fn update_comment_text(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        text: &str,
    ) -> StoreResult<bool> {
        let affected =
            sqlx::query("UPDATE post_comments SET text = $3 WHERE post_id = $1 AND id = $2")
                .bind(post_id)
                .bind(comment_id)
                .bind(text)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(affected > 0)
    }

    async fn remove_comment(&self, post_id: Uuid, comment_id: Uuid) -> StoreResult<bool> {
        let affected = sqlx::query("DELETE FROM post_comments WHERE post_id = $1 AND id = $2")
            .bind(post_id)
            .bind(comment_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }

    async fn update_content(
        &self,
        post_id: Uuid,
        text: Option<&str>,
        img: Option<&str>,
    ) -> StoreResult<bool> {
        let affected = sqlx::query(
            "UPDATE posts SET text = $2, img = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(post_id)
        .bind(text)
        .bind(img)
        .execute(&self.pool)
        .await?
        .rows_affected();
        Ok(affected > 0)
    }

    async fn delete(&self, post_id: Uuid) -> StoreResult<bool> {
        let affected = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected > 0)
    }
}
