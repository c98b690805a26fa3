pub mod config;
pub mod poller;

pub use config::*;
pub use poller::*;
