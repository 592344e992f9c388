pub mod context;
pub mod session;
pub mod transport;

pub use context::ConversationContext;
pub use session::{ ChatSession, SessionOptions, Transcript };
pub use transport::{ HttpRelayTransport, RelayTransport };
