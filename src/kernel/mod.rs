pub mod commands;
pub mod event;
pub mod log;
pub mod reactor;
pub mod scheduler;
pub mod simulator;
pub mod state;
pub mod time;
