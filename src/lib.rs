pub mod app;
pub mod cli;
pub mod config;
pub mod executor;
pub mod expander;
pub mod filter;
pub mod logging;
pub mod output;
pub mod queue;
pub mod runner;
pub mod utils;
pub mod visited;
pub mod wordlist;

#[cfg(test)]
mod tests;
