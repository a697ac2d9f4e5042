pub mod args;
pub mod cache;
pub mod commands;
mod config;
mod error;
pub mod filter;
pub mod generate;
pub mod import;
pub mod model;
pub mod pipeline;
pub mod state;
pub mod store;
mod utils;


pub use config::Config;
pub use error::{Error, ErrorType, FormatError, Result};
pub use state::{Cashbook, CashbookState, Command, Settings};
