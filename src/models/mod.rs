pub mod chat;
pub mod exchange;

pub use chat::{ ChatBubble, MessageKind };
pub use exchange::Exchange;
