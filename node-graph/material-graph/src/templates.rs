use crate::backend::{GraphBackend, GraphError};
use crate::document::value::TaggedValue;

use std::collections::HashMap;
use std::fmt;

/// Identifies a [`NodeTemplate`] once it has been registered into a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TemplateId(pub u32);

impl fmt::Display for TemplateId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "template:{}", self.0)
	}
}

/// The "signature" of a predefined sub-graph: the named inputs (with their default values) and named outputs a group node built from it exposes.
/// The body of the sub-graph is opaque to this crate; only its interface is needed to wire it.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeTemplate {
	pub name: String,
	pub inputs: Vec<(String, TaggedValue)>,
	pub outputs: Vec<String>,
}

impl NodeTemplate {
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), ..Default::default() }
	}

	pub fn with_input(mut self, name: impl Into<String>, default: TaggedValue) -> Self {
		self.inputs.push((name.into(), default));
		self
	}

	pub fn with_output(mut self, name: impl Into<String>) -> Self {
		self.outputs.push(name.into());
		self
	}

	pub fn input_index(&self, name: &str) -> Option<usize> {
		self.inputs.iter().position(|(input, _)| input == name)
	}

	pub fn output_index(&self, name: &str) -> Option<usize> {
		self.outputs.iter().position(|output| output == name)
	}
}

/// Source of predefined sub-graph templates (projection, filter and mask templates).
pub trait AssetLibrary {
	/// Makes the named template available in `backend` and returns its id. Appending the same template twice returns the already registered id.
	fn append_template(&mut self, name: &str, backend: &mut dyn GraphBackend) -> Result<TemplateId, GraphError>;

	fn contains(&self, name: &str) -> bool;
}

/// An in-memory [`AssetLibrary`] holding template definitions keyed by name.
#[derive(Clone, Debug, Default)]
pub struct TemplateLibrary {
	definitions: HashMap<String, NodeTemplate>,
}

impl TemplateLibrary {
	pub fn new(definitions: impl IntoIterator<Item = NodeTemplate>) -> Self {
		Self {
			definitions: definitions.into_iter().map(|template| (template.name.clone(), template)).collect(),
		}
	}

	pub fn insert(&mut self, template: NodeTemplate) -> Option<NodeTemplate> {
		self.definitions.insert(template.name.clone(), template)
	}

	pub fn remove(&mut self, name: &str) -> Option<NodeTemplate> {
		self.definitions.remove(name)
	}

	pub fn get(&self, name: &str) -> Option<&NodeTemplate> {
		self.definitions.get(name)
	}
}

impl AssetLibrary for TemplateLibrary {
	fn append_template(&mut self, name: &str, backend: &mut dyn GraphBackend) -> Result<TemplateId, GraphError> {
		if let Some(id) = backend.find_template(name) {
			return Ok(id);
		}
		let Some(template) = self.definitions.get(name) else {
			warn!("Template \"{name}\" is not in the asset library");
			return Err(GraphError::TemplateNotFound(name.to_string()));
		};
		Ok(backend.register_template(template.clone()))
	}

	fn contains(&self, name: &str) -> bool {
		self.definitions.contains_key(name)
	}
}
