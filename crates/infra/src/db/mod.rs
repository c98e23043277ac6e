pub mod migrations;
pub mod pool;
pub mod trending_repo;

pub use migrations::run_migrations;
pub use pool::{connect_lazy, DbPool, DbPoolError};
pub use trending_repo::{list_top_entries, record_search, TrendingRepoError};
