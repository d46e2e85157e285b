mod connection_events;
mod monitor;
mod peer_manager;
mod recovery;
mod session;
mod session_command;
mod signal_handlers;
mod timers;

pub use peer_manager::*;
