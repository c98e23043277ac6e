pub mod debouncer;
pub mod orchestrator;
pub mod ports;
pub mod trending_loader;

pub use debouncer::Debouncer;
pub use orchestrator::SearchOrchestrator;
pub use trending_loader::TrendingLoader;
