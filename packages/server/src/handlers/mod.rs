pub mod admin;
pub mod auth;
pub mod blog;
pub mod comment;
pub mod dashboard;
pub mod like;
pub mod system;
pub mod upload;
