//! Realtime notifications.
//!
//! Connected users each hold one push channel. [`ConnectionRegistry`] keeps track of those channels and hands
//! [`PushEvent`]s to them. Transport (WebSocket framing, pings, authentication) is the server's concern. The server
//! drains the receiver it gets from [`ConnectionRegistry::register`] into the socket.
mod messages;
mod registry;

pub use messages::{
    order_status_message,
    payment_status_message,
    ConnectionAck,
    OrderUpdate,
    PushEvent,
    CONNECTED_MESSAGE,
};
pub use registry::{ChannelId, ConnectionRegistry, CHANNEL_BUFFER_SIZE};
