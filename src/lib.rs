//! Typed access to a Taskwarrior installation's text formats.
//!
//! - [`config`]: taskrc parsing with `include` splicing and override merging
//! - [`fields`]: attribute codecs and the user-defined attribute registry
//! - [`task`]: task records and their JSON / data-line / argument encodings
//! - [`filter`]: structured filters compiled to query arguments

pub mod cli;
pub mod config;
pub mod error;
pub mod fields;
pub mod filter;
pub mod logging;
pub mod task;

pub use error::{Error, ErrorCode, Result};
