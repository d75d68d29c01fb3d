//! Read-only query guard
//!
//! Ad-hoc queries are for inspection only. Anything that mentions a
//! schema- or data-changing keyword is refused before reaching the database.
//! The match is a case-insensitive substring test, so it also rejects harmless
//! text such as a column named `created_at`; schema changes belong in migrations.

use crate::error::{MigrateError, Result};

/// Keywords checked in this order; the first hit is reported
pub const BLOCKED_KEYWORDS: [&str; 7] = [
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "TRUNCATE", "CREATE",
];

/// Reject `sql` if it contains any blocked keyword.
pub fn ensure_read_only(sql: &str) -> Result<()> {
    let upper = sql.to_uppercase();
    match BLOCKED_KEYWORDS.iter().find(|kw| upper.contains(*kw)) {
        Some(&keyword) => Err(MigrateError::SafetyBlocked(keyword)),
        None => Ok(()),
    }
}
