use crate::messages::material::utility_types::stack::{OutputChannel, ProjectionMode};

use material_graph::{GraphError, SceneError};
use thiserror::Error;

/// The error type used by the layer engine. Every failed operation reports one of these and leaves the stack as it was before the operation.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum StackError {
	#[error("Expected node \"{name}\" is missing from the material")]
	MissingNode { name: String },

	#[error("Node name \"{name}\" is used by more than one node")]
	DuplicateName { name: String },

	#[error("Cannot switch projection from {from} to {to}")]
	InvalidProjectionTransition { from: ProjectionMode, to: ProjectionMode },

	#[error("Template \"{0}\" is missing from the asset library")]
	MissingTemplate(String),

	#[error("Output channel {requested} needs an image source")]
	IncompatibleOutputChannel { requested: OutputChannel },

	#[error("Index {index} is out of bounds for a stack of {len}")]
	IndexOutOfBounds { index: usize, len: usize },

	#[error("Channel \"{0}\" is not part of the channel schema")]
	UnknownChannel(String),

	#[error("Invalid preferences:\n{0}")]
	InvalidPreferences(String),

	#[error("Invalid channel schema:\n{0}")]
	InvalidSchema(String),

	#[error("The graph backend rejected an edit:\n{0}")]
	Graph(#[from] GraphError),

	#[error("The scene rejected an edit:\n{0}")]
	Scene(#[from] SceneError),
}

impl StackError {
	/// The stack no longer matches the graph. The operation can only be retried after a refresh.
	pub fn requires_refresh(&self) -> bool {
		matches!(self, StackError::MissingNode { .. } | StackError::DuplicateName { .. })
	}
}

pub fn check_index(index: usize, len: usize) -> Result<(), StackError> {
	if index >= len {
		return Err(StackError::IndexOutOfBounds { index, len });
	}
	Ok(())
}
