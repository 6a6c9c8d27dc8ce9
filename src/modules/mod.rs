pub mod publisher;
pub mod readings;
