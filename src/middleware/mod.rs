pub mod admin;
pub mod client;
pub mod error_detail;
