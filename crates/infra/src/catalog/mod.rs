pub mod tmdb;

pub use tmdb::{decode_page, CatalogError, TmdbClient, DEFAULT_BASE_URL};
