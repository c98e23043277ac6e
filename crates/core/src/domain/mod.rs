pub mod movie;
pub mod state;
pub mod trending;
