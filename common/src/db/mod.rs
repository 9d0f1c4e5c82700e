// Database layer module: PostgreSQL pool, migrations and store repositories

pub mod pool;
pub mod repositories;

pub use pool::DbPool;
