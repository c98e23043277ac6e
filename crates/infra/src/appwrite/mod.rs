pub mod documents;

pub use documents::{AppwriteClient, AppwriteConfig, AppwriteError};
