use crate::{
    error::RepositoryError,
    models::{
        Account, AdminDashboardStats, Article, ArticleEngagement, Category, Comment,
        DefaultRoles, LikeStatus, ModerationQueueEntry, NewArticle, NewComment, Profile,
        QueueStatus, Role, RoleRecord, UpdateArticleRequest,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::{str::FromStr, sync::Arc};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// The persistence contract. Handlers and the auth extractor only ever see
/// `Arc<dyn Repository>`, so tests can substitute an in-memory database.
///
/// The repository performs no authorization; every caller is expected to have
/// consulted `permissions` first.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Role registry ---
    /// Get-or-create the three canonical roles. Idempotent and race-safe.
    async fn ensure_default_roles(&self) -> RepoResult<DefaultRoles>;
    async fn list_roles(&self) -> RepoResult<Vec<RoleRecord>>;
    async fn create_role(&self, name: &str) -> RepoResult<RoleRecord>;
    /// Returns `false` when the role does not exist, `RoleInUse` when a profile
    /// still references it.
    async fn delete_role(&self, id: i64) -> RepoResult<bool>;

    // --- Accounts & profiles ---
    /// Creates the account and its reader profile in one transaction.
    async fn create_account(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> RepoResult<Account>;
    async fn get_account(&self, id: Uuid) -> RepoResult<Option<Account>>;
    /// The account and its password hash, for the login path only.
    async fn get_credentials(&self, username: &str) -> RepoResult<Option<(Account, String)>>;
    /// The account's profile, provisioning a reader profile if none exists.
    async fn ensure_profile(&self, account_id: Uuid) -> RepoResult<Profile>;
    /// `Ok(None)` when the account is unknown, `NotFound("role")` when the role
    /// is. An unknown role is reported first.
    async fn set_role(&self, account_id: Uuid, role: &Role) -> RepoResult<Option<Profile>>;

    // --- Categories ---
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn get_category(&self, id: Uuid) -> RepoResult<Option<Category>>;
    async fn create_category(&self, name: &str, description: &str) -> RepoResult<Category>;
    async fn update_category(
        &self,
        id: Uuid,
        name: &str,
        description: &str,
    ) -> RepoResult<Option<Category>>;
    /// Dependent articles are detached (category cleared), never deleted.
    async fn delete_category(&self, id: Uuid) -> RepoResult<bool>;

    // --- Articles ---
    /// Newest first, optionally restricted to one category.
    async fn list_articles(&self, category: Option<Uuid>) -> RepoResult<Vec<Article>>;
    async fn get_article(&self, id: Uuid) -> RepoResult<Option<Article>>;
    async fn create_article(&self, article: NewArticle) -> RepoResult<Article>;
    async fn update_article(&self, id: Uuid, req: UpdateArticleRequest)
    -> RepoResult<Option<Article>>;
    async fn delete_article(&self, id: Uuid) -> RepoResult<bool>;
    /// Articles where any term occurs in title, body, author label or
    /// category name. Ranking is done by the caller, which also drops
    /// non-matching rows: for non-ASCII terms this returns every article.
    async fn search_candidates(&self, terms: &[String]) -> RepoResult<Vec<Article>>;

    // --- Comments ---
    async fn create_comment(&self, comment: NewComment) -> RepoResult<Comment>;
    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>>;
    /// Every comment of the article, whatever its state. Visibility is applied
    /// by `visibility::visible_comments`.
    async fn list_comments(&self, article_id: Uuid) -> RepoResult<Vec<Comment>>;
    async fn set_comment_approval(&self, id: i64, approved: bool) -> RepoResult<Option<Comment>>;
    async fn soft_delete_comment(&self, id: i64) -> RepoResult<Option<Comment>>;
    /// Permanently removes the comment and its replies.
    async fn purge_comment(&self, id: i64) -> RepoResult<bool>;
    /// Non-deleted comments with their article, newest first.
    async fn list_moderation_queue(&self, status: QueueStatus)
    -> RepoResult<Vec<ModerationQueueEntry>>;

    // --- Likes ---
    async fn toggle_like(&self, account_id: Uuid, article_id: Uuid) -> RepoResult<LikeStatus>;
    async fn like_status(&self, account_id: Option<Uuid>, article_id: Uuid)
    -> RepoResult<LikeStatus>;

    // --- Stats ---
    async fn global_stats(&self) -> RepoResult<AdminDashboardStats>;
    async fn article_engagement(&self) -> RepoResult<Vec<ArticleEngagement>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// SqliteRepository
///
/// `Repository` backed by SQLite through sqlx. Uniqueness of role names,
/// profiles and likes is enforced by the schema, not by read-then-write checks.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

const ARTICLE_SELECT: &str = r#"
    SELECT a.id, a.title, a.body, a.author_label, a.category_id,
           c.name AS category_name, a.image_key,
           (SELECT COUNT(*) FROM likes l WHERE l.article_id = a.id) AS like_count,
           a.created_at, a.updated_at
    FROM articles a
    LEFT JOIN categories c ON c.id = a.category_id
"#;

const COMMENT_COLUMNS: &str =
    "id, article_id, parent_id, name, email, body, is_approved, is_deleted, created_at";

const PROFILE_SELECT: &str = r#"
    SELECT p.account_id, p.role_id, r.name AS role
    FROM profiles p
    JOIN roles r ON r.id = p.role_id
    WHERE p.account_id = ?
"#;

#[derive(FromRow)]
struct CredentialRow {
    id: Uuid,
    username: String,
    email: String,
    created_at: DateTime<Utc>,
    password_hash: String,
}

#[derive(FromRow)]
struct QueueRow {
    #[sqlx(flatten)]
    comment: Comment,
    article_title: String,
    article_author_label: String,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens (creating if needed) the database at `url` and applies migrations.
    pub async fn connect(url: &str) -> RepoResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self::new(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    /// A private in-memory database. A single, never-recycled connection keeps
    /// the data alive for the lifetime of the pool.
    pub async fn in_memory() -> RepoResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let repo = Self::new(pool);
        repo.migrate().await?;
        Ok(repo)
    }

    pub async fn migrate(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn ensure_role_id(conn: &mut SqliteConnection, name: &str) -> RepoResult<i64> {
        sqlx::query("INSERT INTO roles (name, created_at) VALUES (?, ?) ON CONFLICT(name) DO NOTHING")
            .bind(name)
            .bind(Utc::now())
            .execute(&mut *conn)
            .await?;

        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
        Ok(id)
    }

    async fn fetch_profile(
        conn: &mut SqliteConnection,
        account_id: Uuid,
    ) -> RepoResult<Option<Profile>> {
        let profile = sqlx::query_as::<_, Profile>(PROFILE_SELECT)
            .bind(account_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(profile)
    }
}

/// Maps a unique-constraint violation to `Duplicate(what)`.
fn unique_as_duplicate(err: sqlx::Error, what: &'static str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Duplicate(what),
        _ => RepositoryError::Database(err),
    }
}

/// Escapes LIKE wildcards so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn ensure_default_roles(&self) -> RepoResult<DefaultRoles> {
        let mut tx = self.pool.begin().await?;
        for name in Role::CANONICAL {
            Self::ensure_role_id(&mut tx, name).await?;
        }
        let rows = sqlx::query_as::<_, RoleRecord>(
            "SELECT id, name, created_at FROM roles WHERE name IN (?, ?, ?)",
        )
        .bind(Role::READER)
        .bind(Role::JOURNALIST)
        .bind(Role::ADMIN)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        let pick = |name: &str| {
            rows.iter()
                .find(|r| r.name == name)
                .cloned()
                .ok_or_else(|| RepositoryError::Malformed(format!("role {name} missing")))
        };

        Ok(DefaultRoles {
            reader: pick(Role::READER)?,
            journalist: pick(Role::JOURNALIST)?,
            admin: pick(Role::ADMIN)?,
        })
    }

    async fn list_roles(&self) -> RepoResult<Vec<RoleRecord>> {
        let roles = sqlx::query_as::<_, RoleRecord>("SELECT id, name, created_at FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    async fn create_role(&self, name: &str) -> RepoResult<RoleRecord> {
        sqlx::query_as::<_, RoleRecord>(
            "INSERT INTO roles (name, created_at) VALUES (?, ?) RETURNING id, name, created_at",
        )
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_as_duplicate(e, "role"))
    }

    async fn delete_role(&self, id: i64) -> RepoResult<bool> {
        let Some(name) = sqlx::query_scalar::<_, String>("SELECT name FROM roles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(false);
        };

        // The RESTRICT foreign key is the real guard; the count only lets the
        // common case fail with a clear error before attempting the delete.
        let in_use = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM profiles WHERE role_id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if in_use > 0 {
            return Err(RepositoryError::RoleInUse(name));
        }

        match sqlx::query("DELETE FROM roles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => Ok(res.rows_affected() > 0),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(RepositoryError::RoleInUse(name))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_account(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> RepoResult<Account> {
        let mut tx = self.pool.begin().await?;
        let reader_id = Self::ensure_role_id(&mut tx, Role::READER).await?;

        let account = sqlx::query_as::<_, Account>(
            r#"INSERT INTO accounts (id, username, email, password_hash, created_at)
               VALUES (?, ?, ?, ?, ?)
               RETURNING id, username, email, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| unique_as_duplicate(e, "account"))?;

        sqlx::query("INSERT INTO profiles (account_id, role_id) VALUES (?, ?)")
            .bind(account.id)
            .bind(reader_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(account_id = %account.id, username = %account.username, "account created");
        Ok(account)
    }

    async fn get_account(&self, id: Uuid) -> RepoResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, username, email, created_at FROM accounts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn get_credentials(&self, username: &str) -> RepoResult<Option<(Account, String)>> {
        let row = sqlx::query_as::<_, CredentialRow>(
            "SELECT id, username, email, created_at, password_hash FROM accounts WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            (
                Account {
                    id: r.id,
                    username: r.username,
                    email: r.email,
                    created_at: r.created_at,
                },
                r.password_hash,
            )
        }))
    }

    async fn ensure_profile(&self, account_id: Uuid) -> RepoResult<Profile> {
        // Plain read outside any transaction for the common case.
        {
            let mut conn = self.pool.acquire().await?;
            if let Some(profile) = Self::fetch_profile(&mut conn, account_id).await? {
                return Ok(profile);
            }
        }

        // Every statement below writes before it reads, so the transaction
        // takes the write lock up front instead of upgrading a read lock.
        let mut tx = self.pool.begin().await?;
        let reader_id = Self::ensure_role_id(&mut tx, Role::READER).await?;
        let inserted = match sqlx::query(
            "INSERT INTO profiles (account_id, role_id) VALUES (?, ?) ON CONFLICT(account_id) DO NOTHING",
        )
        .bind(account_id)
        .bind(reader_id)
        .execute(&mut *tx)
        .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                return Err(RepositoryError::NotFound("account"));
            }
            Err(e) => return Err(e.into()),
        };

        let profile = Self::fetch_profile(&mut tx, account_id)
            .await?
            .ok_or(RepositoryError::NotFound("account"))?;
        tx.commit().await?;

        if inserted {
            tracing::warn!(%account_id, "profile was missing; provisioned as reader");
        }
        Ok(profile)
    }

    async fn set_role(&self, account_id: Uuid, role: &Role) -> RepoResult<Option<Profile>> {
        let mut tx = self.pool.begin().await?;

        // Upsert straight from the role lookup: no row when the role is
        // unknown, a foreign key violation when the account is.
        let res = sqlx::query(
            r#"INSERT INTO profiles (account_id, role_id)
               SELECT ?, id FROM roles WHERE name = ?
               ON CONFLICT(account_id) DO UPDATE SET role_id = excluded.role_id"#,
        )
        .bind(account_id)
        .bind(role.name())
        .execute(&mut *tx)
        .await;
        match res {
            Ok(res) if res.rows_affected() == 0 => return Err(RepositoryError::NotFound("role")),
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let profile = Self::fetch_profile(&mut tx, account_id).await?;
        tx.commit().await?;
        Ok(profile)
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn get_category(&self, id: Uuid) -> RepoResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn create_category(&self, name: &str, description: &str) -> RepoResult<Category> {
        sqlx::query_as::<_, Category>(
            r#"INSERT INTO categories (id, name, description, created_at) VALUES (?, ?, ?, ?)
               RETURNING id, name, description, created_at"#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_as_duplicate(e, "category"))
    }

    async fn update_category(
        &self,
        id: Uuid,
        name: &str,
        description: &str,
    ) -> RepoResult<Option<Category>> {
        sqlx::query_as::<_, Category>(
            r#"UPDATE categories SET name = ?, description = ? WHERE id = ?
               RETURNING id, name, description, created_at"#,
        )
        .bind(name)
        .bind(description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_as_duplicate(e, "category"))
    }

    async fn delete_category(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_articles(&self, category: Option<Uuid>) -> RepoResult<Vec<Article>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(ARTICLE_SELECT);
        if let Some(category_id) = category {
            builder.push(" WHERE a.category_id = ");
            builder.push_bind(category_id);
        }
        builder.push(" ORDER BY a.created_at DESC, a.rowid DESC");

        let articles = builder
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    async fn get_article(&self, id: Uuid) -> RepoResult<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!("{ARTICLE_SELECT} WHERE a.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(article)
    }

    async fn create_article(&self, article: NewArticle) -> RepoResult<Article> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let inserted = sqlx::query(
            r#"INSERT INTO articles
                 (id, title, body, author_label, category_id, image_key, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(id)
        .bind(&article.title)
        .bind(&article.body)
        .bind(&article.author_label)
        .bind(article.category_id)
        .bind(&article.image_key)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                return Err(RepositoryError::NotFound("category"));
            }
            Err(e) => return Err(e.into()),
        }

        self.get_article(id)
            .await?
            .ok_or(RepositoryError::NotFound("article"))
    }

    async fn update_article(
        &self,
        id: Uuid,
        req: UpdateArticleRequest,
    ) -> RepoResult<Option<Article>> {
        let updated = sqlx::query(
            r#"
            UPDATE articles
            SET title = COALESCE(?, title),
                body = COALESCE(?, body),
                author_label = COALESCE(?, author_label),
                category_id = CASE WHEN ? THEN NULL ELSE COALESCE(?, category_id) END,
                image_key = CASE WHEN ? THEN NULL ELSE COALESCE(?, image_key) END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(req.title)
        .bind(req.body)
        .bind(req.author_label)
        .bind(req.clear_category)
        .bind(req.category_id)
        .bind(req.clear_image)
        .bind(req.image_key)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await;

        match updated {
            Ok(res) if res.rows_affected() == 0 => Ok(None),
            Ok(_) => self.get_article(id).await,
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(RepositoryError::NotFound("category"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_article(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn search_candidates(&self, terms: &[String]) -> RepoResult<Vec<Article>> {
        if terms.is_empty() {
            return Ok(vec![]);
        }
        // SQLite's LIKE only folds ASCII case, so "économie" would miss
        // "Économie". Hand every article to the ranker instead.
        if !terms.iter().all(|t| t.is_ascii()) {
            return self.list_articles(None).await;
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(ARTICLE_SELECT);
        builder.push(" WHERE ");
        for (i, term) in terms.iter().enumerate() {
            if i > 0 {
                builder.push(" OR ");
            }
            let pattern = like_pattern(term);
            builder.push("(a.title LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR a.body LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR a.author_label LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR c.name LIKE ");
            builder.push_bind(pattern);
            builder.push(" ESCAPE '\\')");
        }
        builder.push(" ORDER BY a.created_at DESC");

        let articles = builder
            .build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await?;
        Ok(articles)
    }

    async fn create_comment(&self, comment: NewComment) -> RepoResult<Comment> {
        let created = sqlx::query_as::<_, Comment>(&format!(
            r#"INSERT INTO comments
                 (article_id, parent_id, name, email, body, is_approved, is_deleted, created_at)
               VALUES (?, ?, ?, ?, ?, ?, 0, ?)
               RETURNING {COMMENT_COLUMNS}"#
        ))
        .bind(comment.article_id)
        .bind(comment.parent_id)
        .bind(&comment.name)
        .bind(&comment.email)
        .bind(&comment.body)
        .bind(comment.is_approved)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match created {
            Ok(c) => Ok(c),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(RepositoryError::NotFound("article"))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn list_comments(&self, article_id: Uuid) -> RepoResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE article_id = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn set_comment_approval(&self, id: i64, approved: bool) -> RepoResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "UPDATE comments SET is_approved = ? WHERE id = ? RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(approved)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn soft_delete_comment(&self, id: i64) -> RepoResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "UPDATE comments SET is_deleted = 1 WHERE id = ? RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn purge_comment(&self, id: i64) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_moderation_queue(
        &self,
        status: QueueStatus,
    ) -> RepoResult<Vec<ModerationQueueEntry>> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT c.id, c.article_id, c.parent_id, c.name, c.email, c.body,
                   c.is_approved, c.is_deleted, c.created_at,
                   a.title AS article_title, a.author_label AS article_author_label
            FROM comments c
            JOIN articles a ON a.id = c.article_id
            WHERE c.is_deleted = 0
            "#,
        );
        match status {
            QueueStatus::Pending => {
                builder.push(" AND c.is_approved = 0");
            }
            QueueStatus::Approved => {
                builder.push(" AND c.is_approved = 1");
            }
            QueueStatus::All => {}
        }
        builder.push(" ORDER BY c.created_at DESC, c.id DESC");

        let rows = builder
            .build_query_as::<QueueRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| ModerationQueueEntry {
                comment: row.comment,
                article_title: row.article_title,
                article_author_label: row.article_author_label,
            })
            .collect())
    }

    /// toggle_like
    ///
    /// Delete-or-insert inside one transaction. The composite primary key keeps
    /// concurrent toggles from different accounts independent and prevents a
    /// duplicate row for the same account.
    async fn toggle_like(&self, account_id: Uuid, article_id: Uuid) -> RepoResult<LikeStatus> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query("DELETE FROM likes WHERE account_id = ? AND article_id = ?")
            .bind(account_id)
            .bind(article_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let liked = if removed > 0 {
            false
        } else {
            let inserted = sqlx::query(
                r#"INSERT INTO likes (account_id, article_id, created_at) VALUES (?, ?, ?)
                   ON CONFLICT(account_id, article_id) DO NOTHING"#,
            )
            .bind(account_id)
            .bind(article_id)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await;

            match inserted {
                Ok(_) => true,
                Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                    return Err(RepositoryError::NotFound("article"));
                }
                Err(e) => return Err(e.into()),
            }
        };

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE article_id = ?")
            .bind(article_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(LikeStatus { liked, total })
    }

    async fn like_status(
        &self,
        account_id: Option<Uuid>,
        article_id: Uuid,
    ) -> RepoResult<LikeStatus> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM likes WHERE article_id = ?")
            .bind(article_id)
            .fetch_one(&self.pool)
            .await?;

        let liked = match account_id {
            Some(account_id) => {
                sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM likes WHERE account_id = ? AND article_id = ?",
                )
                .bind(account_id)
                .bind(article_id)
                .fetch_one(&self.pool)
                .await?
                    > 0
            }
            None => false,
        };

        Ok(LikeStatus { liked, total })
    }

    async fn global_stats(&self) -> RepoResult<AdminDashboardStats> {
        let (
            total_articles,
            total_categories,
            total_comments,
            pending_comments,
            total_likes,
            total_accounts,
        ) = sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64)>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM articles),
                (SELECT COUNT(*) FROM categories),
                (SELECT COUNT(*) FROM comments WHERE is_deleted = 0),
                (SELECT COUNT(*) FROM comments WHERE is_deleted = 0 AND is_approved = 0),
                (SELECT COUNT(*) FROM likes),
                (SELECT COUNT(*) FROM accounts)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(AdminDashboardStats {
            total_articles,
            total_categories,
            total_comments,
            pending_comments,
            total_likes,
            total_accounts,
        })
    }

    async fn article_engagement(&self) -> RepoResult<Vec<ArticleEngagement>> {
        let rows = sqlx::query_as::<_, ArticleEngagement>(
            r#"
            SELECT a.id AS article_id, a.author_label, a.created_at,
                   (SELECT COUNT(*) FROM comments c
                     WHERE c.article_id = a.id AND c.is_deleted = 0) AS comments,
                   (SELECT COUNT(*) FROM comments c
                     WHERE c.article_id = a.id AND c.is_deleted = 0 AND c.is_approved = 0) AS pending_comments,
                   (SELECT COUNT(*) FROM likes l WHERE l.article_id = a.id) AS likes
            FROM articles a
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
