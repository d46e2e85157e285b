pub use tether_core::model::{ConnectionState, Role, RoomId, SenderId};

pub mod model {
    pub use tether_core::model::*;
}

pub mod codec {
    pub use tether_core::codec::*;
}

#[cfg(feature = "peer")]
pub mod peer {
    pub use tether_peer::*;
}

pub mod utils {
    pub use tether_core::utils::*;
}
