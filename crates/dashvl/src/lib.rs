pub mod builders;
pub mod errors;
pub mod key_manager;
pub mod lifecycle;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod stream;
