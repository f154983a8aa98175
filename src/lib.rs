pub mod commands;
pub mod config;
pub mod diff;
pub mod git;
pub mod models;
pub mod paths;
pub mod reconcile;
pub mod shellenv;
pub mod store;
pub mod watch;

/// ASCII art logo for moor CLI
pub const LOGO: &str = "\
  ┌┬┐┌─┐┌─┐┬─┐
  ││││ ││ │├┬┘
  ┴ ┴└─┘└─┘┴└─";
