pub mod assistant;
pub mod config;
pub mod console;
pub mod error;
pub mod kernel;
pub mod services;
pub mod session;
pub mod vision;

pub use config::Config;
pub use kernel::reactor::Reactor;
pub use session::Session;
