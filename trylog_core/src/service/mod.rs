//! Store-side services. Each wraps a database connection, owns its error enum
//! and, except for accounts, is exposed over zel RPC.

pub mod accounts;
pub mod comments;
pub mod posts;
pub mod reactions;
pub mod users;
