pub mod app;
pub mod cli;
pub mod config;
pub mod cursor;
pub mod feed;
pub mod links;
pub mod model;
pub mod output;
pub mod pager;
pub mod render;
pub mod store;
pub mod window;

pub use config::{PagerConfig, PagerOptions};
pub use pager::{InitOutcome, Pager, PagerError};

#[cfg(test)]
mod tests;
