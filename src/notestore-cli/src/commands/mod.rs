//! Command handlers for the notes CLI
//!
//! Each subcommand has its own module with handler functions. Handlers that
//! produce output return a [`ViewResult`](crate::view::ViewResult); `main`
//! prints it and exits with its code.

pub mod configure;
pub mod dump;
pub mod notes;
