pub mod append;
pub mod assets;
pub mod catalog;
pub mod config;
pub mod entry;
pub mod error;
pub mod maintain;
pub mod normalize;
pub mod runtime;
pub mod validate;
