pub mod blog;
pub mod cookie;
pub mod counters;
pub mod hash;
pub mod jwt;
