pub mod history;
pub mod message;
pub mod place;
pub mod session;
