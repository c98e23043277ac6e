pub mod appwrite;
pub mod catalog;
pub mod db;
