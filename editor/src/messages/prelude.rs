// Root-level messages
pub use crate::messages::bake::{BakeMessage, BakeMessageContext, BakeMessageHandler};
pub use crate::messages::material::{MaterialMessage, MaterialMessageContext, MaterialMessageHandler};
pub use crate::messages::message::Message;
pub use crate::messages::preferences::{PreferencesMessage, PreferencesMessageHandler};
pub use crate::messages::response::StackResponse;

// Traits
pub use crate::utility_traits::MessageHandler;

// Error
pub use crate::error::StackError;

pub use std::collections::VecDeque;
