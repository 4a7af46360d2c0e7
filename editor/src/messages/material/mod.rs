mod material_message;
mod material_message_handler;

pub mod node_graph;
pub mod utility_types;

#[doc(inline)]
pub use crate::messages::response::StackResponse;
#[doc(inline)]
pub use material_message::MaterialMessage;
#[doc(inline)]
pub use material_message_handler::{MaterialMessageContext, MaterialMessageHandler};
