pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod ui;

pub use config::ClientSettings;
pub use engine::engine::{ConversationEngine, EngineHandle};
pub use engine::protocol::{EngineCommand, EngineEvent};
pub use engine::transport::{HttpTransport, Transport};
pub use error::TransportError;
pub use model::message::{Message, MessageId, Payload, Sender};
pub use model::place::Place;
