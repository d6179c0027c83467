use std::str::FromStr;

use serde::Deserialize;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::book::{Book, BookUpdate};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("There is no book with isbn `{isbn}`")]
    NotFound { isbn: String },
    #[error("A book with isbn `{isbn}` already exists")]
    Duplicate { isbn: String },
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection url, e.g. `sqlite://books.db`.
    pub url: String,
    #[serde(default = "DatabaseConfig::default_max_connections")]
    pub max_connections: u32,
}

impl DatabaseConfig {
    fn default_max_connections() -> u32 {
        5
    }
}

/// Access to the `books` table.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> RepositoryResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    /// Opens a private in-memory database.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool holds
    /// exactly one connection that is never recycled.
    pub async fn in_memory() -> RepositoryResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self::new(pool))
    }

    /// Creates the `books` table if it does not exist yet.
    #[tracing::instrument(skip(self))]
    pub async fn migrate(&self) -> RepositoryResult<()> {
        sqlx::query(include_str!("../sql/create_books.sql"))
            .execute(&self.pool)
            .await?;

        tracing::debug!("Books table ready");

        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_all(&self) -> RepositoryResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT isbn, amazon_url, author, language, pages, publisher, title, year
            FROM books
            ORDER BY title
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        tracing::trace!(count = books.len(), "Listed books");

        Ok(books)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_isbn(&self, isbn: &str) -> RepositoryResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            SELECT isbn, amazon_url, author, language, pages, publisher, title, year
            FROM books
            WHERE isbn = ?
            "#,
        )
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound {
            isbn: isbn.to_string(),
        })
    }

    #[tracing::instrument(skip_all, fields(isbn = %book.isbn))]
    pub async fn create(&self, book: &Book) -> RepositoryResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (isbn, amazon_url, author, language, pages, publisher, title, year)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING isbn, amazon_url, author, language, pages, publisher, title, year
            "#,
        )
        .bind(&book.isbn)
        .bind(&book.amazon_url)
        .bind(&book.author)
        .bind(&book.language)
        .bind(book.pages)
        .bind(&book.publisher)
        .bind(&book.title)
        .bind(book.year)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match is_unique_violation(&err) {
            true => RepositoryError::Duplicate {
                isbn: book.isbn.clone(),
            },
            false => err.into(),
        })
    }

    /// Overwrites every mutable field of the book with the given `isbn`.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, isbn: &str, update: &BookUpdate) -> RepositoryResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET amazon_url = ?, author = ?, language = ?, pages = ?, publisher = ?, title = ?, year = ?
            WHERE isbn = ?
            RETURNING isbn, amazon_url, author, language, pages, publisher, title, year
            "#,
        )
        .bind(&update.amazon_url)
        .bind(&update.author)
        .bind(&update.language)
        .bind(update.pages)
        .bind(&update.publisher)
        .bind(&update.title)
        .bind(update.year)
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound {
            isbn: isbn.to_string(),
        })
    }

    /// Deletes the book with the given `isbn`, failing with [`RepositoryError::NotFound`] if it does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, isbn: &str) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE isbn = ?")
            .bind(isbn)
            .fetch_one(&mut *tx)
            .await?;

        if count == 0 {
            return Err(RepositoryError::NotFound {
                isbn: isbn.to_string(),
            });
        }

        sqlx::query("DELETE FROM books WHERE isbn = ?")
            .bind(isbn)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
