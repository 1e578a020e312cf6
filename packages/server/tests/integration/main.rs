
mod admin;
mod auth;
mod blog;
mod comment;
mod like;
mod upload;
