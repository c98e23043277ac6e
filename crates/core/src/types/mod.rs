pub mod search_key;
