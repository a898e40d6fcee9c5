//! humancron: define personal routines as workflow files and run them one
//! step at a time.
//!
//! The core is the definition [`parser`], the [`execution`] state machine and
//! the [`command`] runner and result store. [`session::Session`] ties them to
//! the history, link and command collaborators; [`app`] and [`ui`] are the
//! terminal front end.

pub mod command;
pub mod config;
pub mod execution;
pub mod history;
pub mod links;
pub mod loader;
pub mod parser;
pub mod session;

// Terminal front end
pub mod app;
pub mod ui;
