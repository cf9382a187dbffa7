pub mod admin;
pub mod database;
