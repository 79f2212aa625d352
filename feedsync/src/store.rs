use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::watch;

use crate::models::Post;

pub(crate) const MIGRATIONS: &str = r#"
    PRAGMA journal_mode = WAL;

    CREATE TABLE IF NOT EXISTS posts (
        id INTEGER PRIMARY KEY,
        author TEXT NOT NULL,
        content TEXT NOT NULL,
        published_at TEXT NOT NULL,
        liked_by_me INTEGER NOT NULL DEFAULT 0,
        like_count INTEGER NOT NULL DEFAULT 0
    );
"#;

/// Durable post cache: a single sqlite table plus a live read republished
/// after every committed write. The sync repository is the only writer;
/// everything else consumes `observe_all` snapshots.
#[derive(Clone)]
pub struct PostStore {
    conn: Arc<Mutex<Connection>>,
    live: Arc<watch::Sender<Vec<Post>>>,
}

impl PostStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            live: Arc::new(watch::channel(Vec::new()).0),
        };
        store.ensure_migrations()?;
        store.publish()?;
        Ok(store)
    }

    fn ensure_migrations(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(MIGRATIONS)?;
            Ok(())
        })
    }

    pub fn get(&self, id: i64) -> Result<Option<Post>> {
        self.with_conn(|conn| {
            Ok(conn
                .query_row(
                    r#"
                    SELECT id, author, content, published_at, liked_by_me, like_count
                    FROM posts
                    WHERE id = ?1
                    "#,
                    params![id],
                    row_to_post,
                )
                .optional()?)
        })
    }

    /// Idempotent, last-write-wins on id.
    pub fn upsert(&self, post: &Post) -> Result<()> {
        self.with_conn(|conn| {
            upsert_row(conn, post)?;
            Ok(())
        })?;
        self.publish()
    }

    /// Replaces the entire table with `posts` in one transaction, so
    /// concurrent readers never observe a partial list.
    pub fn replace_all(&self, posts: &[Post]) -> Result<()> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("DELETE FROM posts", [])?;
            for post in posts {
                upsert_row(&tx, post)?;
            }
            tx.commit()?;
            Ok(())
        })?;
        self.publish()
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
            Ok(())
        })?;
        self.publish()
    }

    /// All posts, newest first (ids are server-assigned and monotonic).
    pub fn list_all(&self) -> Result<Vec<Post>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, author, content, published_at, liked_by_me, like_count
                FROM posts
                ORDER BY id DESC
                "#,
            )?;
            let rows = stmt.query_map([], row_to_post)?;
            let mut posts = Vec::new();
            for row in rows {
                posts.push(row?);
            }
            Ok(posts)
        })
    }

    /// Live read of the full table, newest first. Re-subscribable; the
    /// receiver holds the latest committed snapshot immediately and sees
    /// every subsequent committed write.
    pub fn observe_all(&self) -> watch::Receiver<Vec<Post>> {
        self.live.subscribe()
    }

    fn publish(&self) -> Result<()> {
        let posts = self.list_all()?;
        tracing::debug!(count = posts.len(), "store snapshot republished");
        self.live.send_replace(posts);
        Ok(())
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| anyhow!("post store mutex poisoned"))?;
        f(&guard)
    }
}

fn upsert_row(conn: &Connection, post: &Post) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT INTO posts (id, author, content, published_at, liked_by_me, like_count)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            author = excluded.author,
            content = excluded.content,
            published_at = excluded.published_at,
            liked_by_me = excluded.liked_by_me,
            like_count = excluded.like_count
        "#,
        params![
            post.id,
            post.author,
            post.content,
            post.published_at,
            post.liked_by_me,
            post.like_count,
        ],
    )?;
    Ok(())
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author: row.get(1)?,
        content: row.get(2)?,
        published_at: row.get(3)?,
        liked_by_me: row.get(4)?,
        like_count: row.get(5)?,
    })
}
