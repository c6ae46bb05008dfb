pub mod user_source;
