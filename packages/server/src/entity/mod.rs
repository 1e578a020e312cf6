pub mod blog;
pub mod blog_tag;
pub mod comment;
pub mod like;
pub mod upgrade_request;
pub mod user;

pub use blog::BlogStatus;
pub use upgrade_request::UpgradeStatus;
pub use user::Role;
