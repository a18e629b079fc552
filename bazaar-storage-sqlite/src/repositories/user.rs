use async_trait::async_trait;
use bazaar_core::{
    Error, User, UserId,
    error::{StorageError, utilities::DatabaseResultExt},
    pagination::{UserListParams, UserSearch},
    repositories::UserRepository,
    user::NewUser,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::{from_timestamp, map_sqlx_err};

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SqliteUser {
    id: String,
    name: String,
    email: String,
    created_at: i64,
    updated_at: i64,
}

impl From<SqliteUser> for User {
    fn from(user: SqliteUser) -> Self {
        User {
            id: UserId::from(user.id),
            name: user.name,
            email: user.email,
            created_at: from_timestamp(user.created_at),
            updated_at: from_timestamp(user.updated_at),
        }
    }
}

/// `LIKE` pattern matching `key` anywhere, with wildcards in `key` escaped
fn contains_pattern(key: &str) -> String {
    let mut pattern = String::with_capacity(key.len() + 2);
    pattern.push('%');
    for c in key.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_search(builder: &mut QueryBuilder<'_, Sqlite>, search: Option<&UserSearch>) {
    if let Some(search) = search {
        builder
            .push(format!(" WHERE lower({}) LIKE ", search.field.column()))
            .push_bind(contains_pattern(&search.key))
            .push(" ESCAPE '\\'");
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, Error> {
        let now = chrono::Utc::now().timestamp();

        let sqlite_user = sqlx::query_as::<_, SqliteUser>(
            r#"
            INSERT INTO users (id, name, email, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, name, email, created_at, updated_at
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.name)
        .bind(&user.email)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(sqlite_user.into())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
        let sqlite_user = sqlx::query_as::<_, SqliteUser>(
            "SELECT id, name, email, created_at, updated_at FROM users WHERE id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_db_err()?;

        Ok(sqlite_user.map(|u| u.into()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let sqlite_user = sqlx::query_as::<_, SqliteUser>(
            "SELECT id, name, email, created_at, updated_at FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_db_err()?;

        Ok(sqlite_user.map(|u| u.into()))
    }

    async fn list(&self, params: &UserListParams) -> Result<Vec<User>, Error> {
        let mut builder =
            QueryBuilder::<Sqlite>::new("SELECT id, name, email, created_at, updated_at FROM users");
        push_search(&mut builder, params.search.as_ref());

        // Column and direction come from closed enums, never from raw input.
        builder
            .push(format!(
                " ORDER BY {} {}, id ASC LIMIT ",
                params.sort.field.column(),
                params.sort.order.as_sql()
            ))
            .push_bind(i64::from(params.limit()))
            .push(" OFFSET ")
            .push_bind(params.offset() as i64);

        let users = builder
            .build_query_as::<SqliteUser>()
            .fetch_all(&self.pool)
            .await
            .map_db_err()?;

        Ok(users.into_iter().map(User::from).collect())
    }

    async fn count(&self, search: Option<&UserSearch>) -> Result<u64, Error> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM users");
        push_search(&mut builder, search);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_db_err()?;

        Ok(count as u64)
    }

    async fn update(&self, user: &User) -> Result<User, Error> {
        let now = chrono::Utc::now().timestamp();

        let sqlite_user = sqlx::query_as::<_, SqliteUser>(
            r#"
            UPDATE users
            SET name = ?2, email = ?3, updated_at = ?4
            WHERE id = ?1
            RETURNING id, name, email, created_at, updated_at
            "#,
        )
        .bind(user.id.as_str())
        .bind(&user.name)
        .bind(&user.email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        sqlite_user
            .map(User::from)
            .ok_or(Error::Storage(StorageError::NotFound))
    }

    async fn delete(&self, id: &UserId) -> Result<(), Error> {
        sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        Ok(())
    }
}
