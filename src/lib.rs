pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod flight;
pub mod guard;
pub mod router;
pub mod session;
pub mod store;

#[cfg(test)]
pub mod testing;
