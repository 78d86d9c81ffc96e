pub mod analyzer;
pub mod config;
pub mod context;
pub mod decision;
pub mod engine;
pub mod error;
pub mod feedback;
pub mod io;
pub mod paths;
pub mod recommendation;
pub mod rules;
pub mod simulate;
pub mod tree;
pub mod types;

pub use error::{Result, RouterError};
