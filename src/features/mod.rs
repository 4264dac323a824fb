pub mod chat;
pub mod digest;

pub use chat::{chat, neutral_summary};
pub use digest::build_digest;
