mod connection_event;
mod peer_connection;
mod rtc_connection;

pub use connection_event::*;
pub use peer_connection::*;
pub use rtc_connection::*;
