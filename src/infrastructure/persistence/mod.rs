pub mod database;
pub mod repositories;
pub mod transaction;

pub use database::Database;
pub use transaction::SqliteTransactionManager;
