pub mod proposal;
pub mod timeline;
pub mod token;
pub mod user;
pub mod workflow;
