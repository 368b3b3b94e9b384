//! Single-slot quote cache.
//!
//! # Invariants
//! - The `quote_cache` table holds at most one row (`id = 1`).
//! - `save_quote` overwrites the slot and swallows failures after logging.

use super::{Quote, QuoteClient, QuoteResult};
use crate::db::migrations::ensure_schema_current;
use crate::repo::entry_repo::RepoResult;
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};

/// Storage for the most recently fetched quote.
pub trait QuoteCache {
    /// Fire-and-forget overwrite of the cached quote.
    fn save_quote(&self, quote: &Quote);
    fn load_quote(&self) -> RepoResult<Option<Quote>>;
}

/// SQLite-backed single-slot quote cache.
pub struct SqliteQuoteCache<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteQuoteCache<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_current(conn)?;
        Ok(Self { conn })
    }
}

impl QuoteCache for SqliteQuoteCache<'_> {
    fn save_quote(&self, quote: &Quote) {
        let result = self.conn.execute(
            "INSERT INTO quote_cache (id, quote, author)
             VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET
                quote = excluded.quote,
                author = excluded.author,
                fetched_at = (strftime('%s', 'now') * 1000);",
            params![quote.quote.as_str(), quote.author.as_str()],
        );

        match result {
            Ok(_) => debug!("event=quote_cache_save module=quote status=ok"),
            Err(err) => warn!("event=quote_cache_save module=quote status=error error={err}"),
        }
    }

    fn load_quote(&self) -> RepoResult<Option<Quote>> {
        let quote = self
            .conn
            .query_row(
                "SELECT quote, author FROM quote_cache WHERE id = 1;",
                [],
                |row| Ok(Quote::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        Ok(quote)
    }
}

/// Fetches a quote and, on success, overwrites the cache slot.
///
/// Cache failures do not change the returned result.
pub fn fetch_and_cache(client: &QuoteClient, cache: &impl QuoteCache) -> QuoteResult<Quote> {
    let quote = client.fetch_quote()?;
    cache.save_quote(&quote);
    Ok(quote)
}
