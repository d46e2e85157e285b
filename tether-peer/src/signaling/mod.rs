mod inbound_filter;
mod local_relay;
mod outbound_queue;
mod relay;
mod signaling_transport;
mod transport_event;

pub use inbound_filter::*;
pub use local_relay::*;
pub use outbound_queue::*;
pub use relay::*;
pub use signaling_transport::*;
pub use transport_event::*;
