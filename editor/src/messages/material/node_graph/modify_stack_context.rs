use crate::error::StackError;
use crate::messages::material::utility_types::channel_schema::ChannelSchema;
use crate::messages::preferences::PreferencesMessageHandler;

use glam::IVec2;
use material_graph::{AssetLibrary, DocumentNode, GraphBackend, GraphError, InputConnector, NodeId, NodeKind, OutputConnector, SceneObjects, TaggedValue, TemplateId};

/// Everything a stack operation reads or edits while it runs. Borrowed for the duration of one operation.
pub struct ModifyStackContext<'a> {
	pub network: &'a mut dyn GraphBackend,
	pub assets: &'a mut dyn AssetLibrary,
	pub scene: &'a mut dyn SceneObjects,
	pub schema: &'a ChannelSchema,
	pub preferences: &'a PreferencesMessageHandler,
}

impl<'a> ModifyStackContext<'a> {
	/// Registers the named template with the network, appending it from the asset library if needed.
	pub fn template(&mut self, name: &str) -> Result<TemplateId, StackError> {
		if let Some(template) = self.network.find_template(name) {
			return Ok(template);
		}
		self.assets.append_template(name, &mut *self.network).map_err(|error| match error {
			GraphError::TemplateNotFound(_) => StackError::MissingTemplate(name.to_string()),
			error => error.into(),
		})
	}

	pub fn node(&self, node_id: NodeId) -> Result<&DocumentNode, StackError> {
		self.network.node(node_id).ok_or(StackError::Graph(GraphError::NodeNotFound(node_id)))
	}

	fn group_template(&self, node_id: NodeId) -> Result<TemplateId, StackError> {
		self.node(node_id)?.kind.template().ok_or(StackError::Graph(GraphError::NotAGroup(node_id)))
	}

	/// The output of a group node with the given socket name.
	pub fn output_socket(&self, node_id: NodeId, socket: &str) -> Result<OutputConnector, StackError> {
		let template_id = self.group_template(node_id)?;
		let template = self.network.template(template_id).ok_or_else(|| StackError::MissingTemplate(template_id.to_string()))?;
		let output_index = template.output_index(socket).ok_or_else(|| StackError::MissingTemplate(format!("{} (output \"{socket}\")", template.name)))?;
		Ok(OutputConnector::node(node_id, output_index))
	}

	/// The input of a group node with the given socket name.
	pub fn input_socket(&self, node_id: NodeId, socket: &str) -> Result<InputConnector, StackError> {
		let template_id = self.group_template(node_id)?;
		let template = self.network.template(template_id).ok_or_else(|| StackError::MissingTemplate(template_id.to_string()))?;
		let input_index = template.input_index(socket).ok_or_else(|| StackError::MissingTemplate(format!("{} (input \"{socket}\")", template.name)))?;
		Ok(InputConnector::node(node_id, input_index))
	}

	/// Fails unless the registered template exposes every named input and output.
	pub fn check_sockets(&self, template_id: TemplateId, inputs: &[&str], outputs: &[&str]) -> Result<(), StackError> {
		let template = self.network.template(template_id).ok_or_else(|| StackError::MissingTemplate(template_id.to_string()))?;
		if let Some(socket) = inputs.iter().find(|socket| template.input_index(socket).is_none()) {
			return Err(StackError::MissingTemplate(format!("{} (input \"{socket}\")", template.name)));
		}
		if let Some(socket) = outputs.iter().find(|socket| template.output_index(socket).is_none()) {
			return Err(StackError::MissingTemplate(format!("{} (output \"{socket}\")", template.name)));
		}
		Ok(())
	}

	/// Like [`Self::input_socket`], but `None` when the node has no such input.
	pub fn find_input_socket(&self, node_id: NodeId, socket: &str) -> Option<InputConnector> {
		let template = self.network.template(self.network.node(node_id)?.kind.template()?)?;
		template.input_index(socket).map(|input_index| InputConnector::node(node_id, input_index))
	}

	pub fn connect(&mut self, from: OutputConnector, to: InputConnector) -> Result<(), StackError> {
		trace!("Connecting {}:{} to {}:{}", from.node_id, from.output_index, to.node_id, to.input_index);
		self.network.connect(from, to)?;
		Ok(())
	}

	pub fn disconnect(&mut self, input: InputConnector) -> Result<(), StackError> {
		self.network.disconnect(input)?;
		Ok(())
	}

	pub fn set_input_value(&mut self, input: InputConnector, value: TaggedValue) -> Result<(), StackError> {
		self.network.set_input_value(input, value)?;
		Ok(())
	}

	pub fn is_linked(&self, input: InputConnector) -> bool {
		self.network
			.node(input.node_id)
			.and_then(|node| node.inputs.get(input.input_index))
			.is_some_and(|input| input.is_linked())
	}

	/// The grid position `(column, row)` scaled by the node spacing preference.
	pub fn position(&self, column: i32, row: i32) -> IVec2 {
		IVec2::new(column, row) * self.preferences.node_spacing
	}

	/// First row used by the sub-graph of a layer.
	pub fn layer_row(&self, layer: usize) -> i32 {
		layer as i32 * (self.schema.len() as i32 + crate::consts::MASK_ROWS_PER_LAYER)
	}

	/// The row used by the sub-graph of a mask.
	pub fn mask_row(&self, layer: usize, mask: usize) -> i32 {
		self.layer_row(layer) + self.schema.len() as i32 + mask as i32
	}
}

/// Tracks the nodes created while building a sub-graph, so a failed build can be undone before any of it becomes visible to the stack.
#[derive(Debug, Default)]
pub struct Staging {
	created: Vec<NodeId>,
}

impl Staging {
	pub fn create_node(&mut self, context: &mut ModifyStackContext, kind: NodeKind, name: &str, label: &str, position: IVec2) -> Result<NodeId, StackError> {
		let node_id = context.network.create_node(kind)?;
		self.created.push(node_id);
		context.network.rename(node_id, name)?;
		context.network.set_label(node_id, label)?;
		context.network.set_position(node_id, position)?;
		Ok(node_id)
	}

	pub fn instantiate(&mut self, context: &mut ModifyStackContext, template: TemplateId, name: &str, label: &str, position: IVec2) -> Result<NodeId, StackError> {
		self.create_node(context, NodeKind::Group { template }, name, label, position)
	}

	/// Creates a node doing the same thing as `source`, with its unlinked input values but none of its links.
	pub fn copy_node(&mut self, context: &mut ModifyStackContext, source: NodeId, name: &str, label: &str, position: IVec2) -> Result<NodeId, StackError> {
		let source = context.node(source)?;
		let kind = source.kind.clone();
		let values = source.inputs.iter().map(|input| input.as_value().cloned()).collect::<Vec<_>>();
		let node_id = self.create_node(context, kind, name, label, position)?;
		for (input_index, value) in values.into_iter().enumerate() {
			if let Some(value) = value {
				context.set_input_value(InputConnector::node(node_id, input_index), value)?;
			}
		}
		Ok(node_id)
	}

	/// Keeps every created node.
	pub fn commit(self) -> Vec<NodeId> {
		self.created
	}

	/// Removes every created node again.
	pub fn discard(self, network: &mut dyn GraphBackend) {
		for node_id in self.created.into_iter().rev() {
			if let Err(error) = network.remove_node(node_id) {
				warn!("Could not discard staged node {node_id}: {error}");
			}
		}
	}
}
