pub mod base;
pub mod configs;
pub mod dashscope;
pub mod utils;

#[cfg(test)]
pub mod mock;
