pub mod content;
pub mod message;
pub mod request;
pub mod role;
