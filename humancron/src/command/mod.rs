//! Out-of-process execution of step commands and their cached results

pub mod runner;
pub mod store;

pub use runner::ShellCommandRunner;
pub use store::{CommandResultStore, SharedCommandStore};
