use crate::dispatcher::{Dispatcher, EditorBackends};
use crate::messages::material::utility_types::channel_schema::ChannelSchema;
use crate::messages::prelude::*;

/// The layer engine of one material editor. The host owns the graph, asset library, scene and bake runner and lends them to every call.
pub struct Editor {
	pub dispatcher: Dispatcher,
}

impl Editor {
	/// Construct the editor for materials built from `schema`.
	pub fn new(schema: ChannelSchema) -> Self {
		Self { dispatcher: Dispatcher::new(schema) }
	}

	pub fn handle_message<T: Into<Message>>(&mut self, message: T, backends: &mut EditorBackends) -> Vec<StackResponse> {
		self.dispatcher.handle_message(message, backends);

		std::mem::take(&mut self.dispatcher.responses)
	}

	pub fn material(&self) -> &MaterialMessageHandler {
		&self.dispatcher.message_handlers.material_message_handler
	}

	pub fn preferences(&self) -> &PreferencesMessageHandler {
		&self.dispatcher.message_handlers.preferences_message_handler
	}

	pub fn is_baking(&self) -> bool {
		self.dispatcher.message_handlers.bake_message_handler.is_baking()
	}
}

impl Default for Editor {
	fn default() -> Self {
		Self::new(ChannelSchema::default())
	}
}
