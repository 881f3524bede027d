//! Command-line front end for the draft contract engine
//!
//! The `dce` binary is a thin shell over [`commands`]; persistence across
//! invocations goes through [`file_store::FileDraftStore`].

#![warn(unreachable_pub)]

pub mod commands;
pub mod file_store;

pub use file_store::FileDraftStore;
