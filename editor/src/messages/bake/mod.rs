mod bake_message;
mod bake_message_handler;

pub mod utility_types;

#[doc(inline)]
pub use bake_message::BakeMessage;
#[doc(inline)]
pub use bake_message_handler::{BakeMessageContext, BakeMessageHandler};
#[doc(inline)]
pub use utility_types::{BakeJob, BakeRunner, BakeStatus};
