use crate::messages::material::utility_types::channel_schema::ChannelSchema;
use crate::messages::prelude::*;

use material_graph::{AssetLibrary, GraphBackend, SceneObjects};

/// The host-owned state a message is processed against.
pub struct EditorBackends<'a> {
	pub network: &'a mut dyn GraphBackend,
	pub assets: &'a mut dyn AssetLibrary,
	pub scene: &'a mut dyn SceneObjects,
	pub runner: &'a mut dyn crate::messages::bake::BakeRunner,
}

#[derive(Debug, Default)]
pub struct Dispatcher {
	message_queues: Vec<VecDeque<Message>>,
	pub responses: Vec<StackResponse>,
	pub message_handlers: DispatcherMessageHandlers,
	/// Read once per material and shared by every operation on it.
	pub schema: ChannelSchema,
}

#[derive(Debug, Default)]
pub struct DispatcherMessageHandlers {
	pub bake_message_handler: BakeMessageHandler,
	pub material_message_handler: MaterialMessageHandler,
	pub preferences_message_handler: PreferencesMessageHandler,
}

impl Dispatcher {
	pub fn new(schema: ChannelSchema) -> Self {
		Self { schema, ..Default::default() }
	}

	// Drops every exhausted queue from the top of the stack so the next pop resumes the parent's siblings
	fn cleanup_queues(&mut self) {
		while self.message_queues.last().is_some_and(VecDeque::is_empty) {
			self.message_queues.pop();
		}
	}

	/// Processes `message` and every message it causes, depth first, so the children of a message run before its later siblings.
	pub fn handle_message<T: Into<Message>>(&mut self, message: T, backends: &mut EditorBackends) {
		self.message_queues.push(VecDeque::from([message.into()]));

		while let Some(message) = self.message_queues.last_mut().and_then(VecDeque::pop_front) {
			trace!("Processing {message:?}");

			// Create a new queue for the child messages
			let mut queue = VecDeque::new();

			match message {
				Message::NoOp => {}
				Message::Batched(messages) => queue.extend(messages.into_vec()),
				Message::Bake(message) => {
					let context = BakeMessageContext {
						runner: &mut *backends.runner,
						isolation: self.message_handlers.material_message_handler.isolation.as_ref(),
					};
					self.message_handlers.bake_message_handler.process_message(message, &mut queue, context);
				}
				Message::Material(message) => {
					let context = MaterialMessageContext {
						network: &mut *backends.network,
						assets: &mut *backends.assets,
						scene: &mut *backends.scene,
						schema: &self.schema,
						preferences: &self.message_handlers.preferences_message_handler,
					};
					self.message_handlers.material_message_handler.process_message(message, &mut queue, context);
				}
				Message::Preferences(message) => {
					self.message_handlers.preferences_message_handler.process_message(message, &mut queue, ());
				}
				// `StackResponse`s are saved and returned to the host after the message queue is done being processed
				Message::Response(response) => self.responses.push(response),
			}

			self.cleanup_queues();
			if !queue.is_empty() {
				self.message_queues.push(queue);
			}
		}
	}
}
