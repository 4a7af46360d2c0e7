use crate::messages::prelude::*;

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
	NoOp,
	Batched(Box<[Message]>),

	Bake(BakeMessage),
	Material(MaterialMessage),
	Preferences(PreferencesMessage),
	/// Collected by the dispatcher and returned to the host once the queue is empty.
	Response(StackResponse),
}

impl From<BakeMessage> for Message {
	fn from(message: BakeMessage) -> Self {
		Message::Bake(message)
	}
}

impl From<MaterialMessage> for Message {
	fn from(message: MaterialMessage) -> Self {
		Message::Material(message)
	}
}

impl From<PreferencesMessage> for Message {
	fn from(message: PreferencesMessage) -> Self {
		Message::Preferences(message)
	}
}

impl From<StackResponse> for Message {
	fn from(response: StackResponse) -> Self {
		Message::Response(response)
	}
}
