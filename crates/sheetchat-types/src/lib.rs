pub mod models;
pub mod protocol;
pub mod wire;

pub use models::{Message, MessageKind, Row};
