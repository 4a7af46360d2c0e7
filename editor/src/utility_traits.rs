pub use crate::messages::message::Message;

use std::collections::VecDeque;

pub trait MessageHandler<M, C> {
	/// Handles `message`. Messages for other handlers, and responses for the host, are pushed onto `responses` and processed after this one.
	fn process_message(&mut self, message: M, responses: &mut VecDeque<Message>, context: C);
}
