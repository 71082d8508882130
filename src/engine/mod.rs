pub mod engine;
pub mod protocol;
pub mod reveal;

pub mod response_parser;
pub mod transport;
