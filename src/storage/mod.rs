pub mod database;
pub mod versions;

pub use database::{Database, PoolConfig, SharedDatabase};
pub use versions::VersionStore;
