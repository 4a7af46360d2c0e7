use crate::document::value::TaggedValue;
use crate::document::{DocumentNode, InputConnector, NodeId, NodeInput, NodeKind, NodeNetwork, OutputConnector};
use crate::templates::{NodeTemplate, TemplateId};

use glam::IVec2;
use std::collections::HashMap;
use thiserror::Error;

/// A set of different errors that can occur when mutating a graph.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GraphError {
	#[error("Node {0} does not exist in the network")]
	NodeNotFound(NodeId),
	#[error("Node {node_id} has no input {input_index}")]
	InputOutOfRange { node_id: NodeId, input_index: usize },
	#[error("Node {node_id} has no output {output_index}")]
	OutputOutOfRange { node_id: NodeId, output_index: usize },
	#[error("Template \"{0}\" could not be found")]
	TemplateNotFound(String),
	#[error("Node {0} is not a group node")]
	NotAGroup(NodeId),
}

/// The host graph runtime. All mutations are synchronous and strongly consistent: once a call returns, its effect is fully visible.
///
/// The trait is object safe so the layer engine can hold it as `&mut dyn GraphBackend`.
pub trait GraphBackend {
	/// Creates an unnamed node whose inputs hold the default values of its kind.
	fn create_node(&mut self, kind: NodeKind) -> Result<NodeId, GraphError>;
	/// Removes a node. Every input that was fed by it falls back to its default value.
	fn remove_node(&mut self, node_id: NodeId) -> Result<DocumentNode, GraphError>;
	/// Links `output` into `input`, replacing whatever fed `input` before.
	fn connect(&mut self, output: OutputConnector, input: InputConnector) -> Result<(), GraphError>;
	/// Unlinks `input`, restoring its default value. Does nothing if it was not linked.
	fn disconnect(&mut self, input: InputConnector) -> Result<(), GraphError>;
	fn rename(&mut self, node_id: NodeId, name: &str) -> Result<(), GraphError>;
	fn find_by_name(&self, name: &str) -> Option<NodeId>;
	/// Creates a group node from a registered template.
	fn instantiate_template(&mut self, template: TemplateId) -> Result<NodeId, GraphError>;

	fn node(&self, node_id: NodeId) -> Option<&DocumentNode>;
	/// Every node carrying `name`. More than one result means the network is inconsistent.
	fn nodes_named(&self, name: &str) -> Vec<NodeId>;
	fn set_label(&mut self, node_id: NodeId, label: &str) -> Result<(), GraphError>;
	fn set_muted(&mut self, node_id: NodeId, muted: bool) -> Result<(), GraphError>;
	fn set_position(&mut self, node_id: NodeId, position: IVec2) -> Result<(), GraphError>;
	/// Sets the default value of an input, which is also its current value unless it is linked.
	fn set_input_value(&mut self, input: InputConnector, value: TaggedValue) -> Result<(), GraphError>;
	/// Changes the kind of a node. Links are kept if the new kind has the same signature, otherwise the inputs are reset.
	fn set_node_kind(&mut self, node_id: NodeId, kind: NodeKind) -> Result<(), GraphError>;
	/// Points a group node at another template. Inputs are reset to the new template's defaults and consumers of outputs that no longer exist are disconnected.
	fn replace_template(&mut self, node_id: NodeId, template: TemplateId) -> Result<(), GraphError>;
	/// Deep copies a set of nodes. Links between copied nodes are remapped onto the copies, links from outside the set are kept.
	fn duplicate_nodes(&mut self, nodes: &[NodeId]) -> Result<HashMap<NodeId, NodeId>, GraphError>;
	/// Every input currently fed by `output`.
	fn consumers(&self, output: OutputConnector) -> Vec<InputConnector>;

	fn register_template(&mut self, template: NodeTemplate) -> TemplateId;
	fn template(&self, template: TemplateId) -> Option<&NodeTemplate>;
	fn find_template(&self, name: &str) -> Option<TemplateId>;
}

impl NodeNetwork {
	fn node_mut(&mut self, node_id: NodeId) -> Result<&mut DocumentNode, GraphError> {
		self.nodes.get_mut(&node_id).ok_or(GraphError::NodeNotFound(node_id))
	}

	fn check_output(&self, output: OutputConnector) -> Result<(), GraphError> {
		let node = self.nodes.get(&output.node_id).ok_or(GraphError::NodeNotFound(output.node_id))?;
		if output.output_index >= node.outputs {
			return Err(GraphError::OutputOutOfRange {
				node_id: output.node_id,
				output_index: output.output_index,
			});
		}
		Ok(())
	}

	fn input_mut(&mut self, input: InputConnector) -> Result<(&mut NodeInput, &TaggedValue), GraphError> {
		let node = self.node_mut(input.node_id)?;
		let out_of_range = GraphError::InputOutOfRange {
			node_id: input.node_id,
			input_index: input.input_index,
		};
		match (node.inputs.get_mut(input.input_index), node.defaults.get(input.input_index)) {
			(Some(slot), Some(default)) => Ok((slot, default)),
			_ => Err(out_of_range),
		}
	}

	/// Disconnects every input fed by an output of `node_id` at or above `first_output`.
	fn disconnect_consumers(&mut self, node_id: NodeId, first_output: usize) {
		for node in self.nodes.values_mut() {
			for (input, default) in node.inputs.iter_mut().zip(node.defaults.iter()) {
				if matches!(input, NodeInput::Node { node_id: upstream, output_index } if *upstream == node_id && *output_index >= first_output) {
					*input = NodeInput::value(default.clone());
				}
			}
		}
	}
}

impl GraphBackend for NodeNetwork {
	fn create_node(&mut self, kind: NodeKind) -> Result<NodeId, GraphError> {
		let Some((defaults, outputs)) = kind.signature(&self.templates) else {
			return Err(GraphError::TemplateNotFound(format!("{:?}", kind.template())));
		};
		let node_id = self.generate_node_id();
		self.nodes.insert(node_id, DocumentNode::new(kind, defaults, outputs));
		trace!("Created node {node_id}");
		Ok(node_id)
	}

	fn remove_node(&mut self, node_id: NodeId) -> Result<DocumentNode, GraphError> {
		let node = self.nodes.remove(&node_id).ok_or(GraphError::NodeNotFound(node_id))?;
		self.disconnect_consumers(node_id, 0);
		trace!("Removed node {node_id} \"{}\"", node.name);
		Ok(node)
	}

	fn connect(&mut self, output: OutputConnector, input: InputConnector) -> Result<(), GraphError> {
		self.check_output(output)?;
		let (slot, _) = self.input_mut(input)?;
		*slot = NodeInput::node(output.node_id, output.output_index);
		Ok(())
	}

	fn disconnect(&mut self, input: InputConnector) -> Result<(), GraphError> {
		let (slot, default) = self.input_mut(input)?;
		if slot.is_linked() {
			*slot = NodeInput::value(default.clone());
		}
		Ok(())
	}

	fn rename(&mut self, node_id: NodeId, name: &str) -> Result<(), GraphError> {
		let node = self.node_mut(node_id)?;
		trace!("Renaming \"{}\" to \"{name}\"", node.name);
		node.name = name.to_string();
		Ok(())
	}

	fn find_by_name(&self, name: &str) -> Option<NodeId> {
		self.nodes.iter().find(|(_, node)| node.name == name).map(|(node_id, _)| *node_id)
	}

	fn instantiate_template(&mut self, template: TemplateId) -> Result<NodeId, GraphError> {
		if !self.templates.contains_key(&template) {
			return Err(GraphError::TemplateNotFound(template.to_string()));
		}
		self.create_node(NodeKind::Group { template })
	}

	fn node(&self, node_id: NodeId) -> Option<&DocumentNode> {
		self.nodes.get(&node_id)
	}

	fn nodes_named(&self, name: &str) -> Vec<NodeId> {
		let mut nodes = self.nodes.iter().filter(|(_, node)| node.name == name).map(|(node_id, _)| *node_id).collect::<Vec<_>>();
		nodes.sort();
		nodes
	}

	fn set_label(&mut self, node_id: NodeId, label: &str) -> Result<(), GraphError> {
		self.node_mut(node_id)?.label = label.to_string();
		Ok(())
	}

	fn set_muted(&mut self, node_id: NodeId, muted: bool) -> Result<(), GraphError> {
		self.node_mut(node_id)?.muted = muted;
		Ok(())
	}

	fn set_position(&mut self, node_id: NodeId, position: IVec2) -> Result<(), GraphError> {
		self.node_mut(node_id)?.metadata.position = position;
		Ok(())
	}

	fn set_input_value(&mut self, input: InputConnector, value: TaggedValue) -> Result<(), GraphError> {
		let node = self.node_mut(input.node_id)?;
		let (Some(slot), Some(default)) = (node.inputs.get_mut(input.input_index), node.defaults.get_mut(input.input_index)) else {
			return Err(GraphError::InputOutOfRange {
				node_id: input.node_id,
				input_index: input.input_index,
			});
		};
		if !slot.is_linked() {
			*slot = NodeInput::value(value.clone());
		}
		*default = value;
		Ok(())
	}

	fn set_node_kind(&mut self, node_id: NodeId, kind: NodeKind) -> Result<(), GraphError> {
		let Some((defaults, outputs)) = kind.signature(&self.templates) else {
			return Err(GraphError::TemplateNotFound(format!("{:?}", kind.template())));
		};
		let node = self.node_mut(node_id)?;
		let same_signature = node.defaults.len() == defaults.len() && node.outputs == outputs;
		node.kind = kind;
		if !same_signature {
			node.inputs = defaults.iter().cloned().map(NodeInput::value).collect();
			node.defaults = defaults;
			node.outputs = outputs;
			self.disconnect_consumers(node_id, outputs);
		}
		Ok(())
	}

	fn replace_template(&mut self, node_id: NodeId, template: TemplateId) -> Result<(), GraphError> {
		let Some(definition) = self.templates.get(&template) else {
			return Err(GraphError::TemplateNotFound(template.to_string()));
		};
		let defaults = definition.inputs.iter().map(|(_, default)| default.clone()).collect::<Vec<_>>();
		let outputs = definition.outputs.len();

		let node = self.node_mut(node_id)?;
		if !matches!(node.kind, NodeKind::Group { .. }) {
			return Err(GraphError::NotAGroup(node_id));
		}
		node.kind = NodeKind::Group { template };
		node.inputs = defaults.iter().cloned().map(NodeInput::value).collect();
		node.defaults = defaults;
		node.outputs = outputs;
		self.disconnect_consumers(node_id, outputs);
		Ok(())
	}

	fn duplicate_nodes(&mut self, nodes: &[NodeId]) -> Result<HashMap<NodeId, NodeId>, GraphError> {
		if let Some(missing) = nodes.iter().find(|node_id| !self.nodes.contains_key(node_id)) {
			return Err(GraphError::NodeNotFound(*missing));
		}
		let new_ids = nodes.iter().map(|&node_id| (node_id, self.generate_node_id())).collect::<HashMap<_, _>>();
		for (old_id, new_id) in &new_ids {
			let mut copy = self.nodes[old_id].clone();
			for input in &mut copy.inputs {
				if let NodeInput::Node { node_id, .. } = input {
					if let Some(mapped) = new_ids.get(node_id) {
						*node_id = *mapped;
					}
				}
			}
			self.nodes.insert(*new_id, copy);
		}
		Ok(new_ids)
	}

	fn consumers(&self, output: OutputConnector) -> Vec<InputConnector> {
		let mut consumers = self
			.nodes
			.iter()
			.flat_map(|(node_id, node)| node.upstream().filter(|(_, upstream)| *upstream == output).map(move |(index, _)| InputConnector::node(*node_id, index)))
			.collect::<Vec<_>>();
		consumers.sort_by_key(|input| (input.node_id, input.input_index));
		consumers
	}

	fn register_template(&mut self, template: NodeTemplate) -> TemplateId {
		if let Some(existing) = self.find_template(&template.name) {
			return existing;
		}
		let id = self.generate_template_id();
		debug!("Registered template \"{}\" as {id}", template.name);
		self.templates.insert(id, template);
		id
	}

	fn template(&self, template: TemplateId) -> Option<&NodeTemplate> {
		self.templates.get(&template)
	}

	fn find_template(&self, name: &str) -> Option<TemplateId> {
		self.templates.iter().find(|(_, template)| template.name == name).map(|(id, _)| *id)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::document::value::BlendMode;
	use pretty_assertions::assert_eq;

	fn mix_network() -> (NodeNetwork, NodeId, NodeId) {
		let mut network = NodeNetwork::default();
		let constant = network.create_node(NodeKind::Constant).unwrap();
		let mix = network.create_node(NodeKind::Mix { blend_mode: BlendMode::Mix }).unwrap();
		network.set_input_value(InputConnector::node(constant, 0), TaggedValue::F32(0.5)).unwrap();
		network.set_input_value(InputConnector::node(mix, 2), TaggedValue::F32(0.25)).unwrap();
		network.connect(OutputConnector::node(constant, 0), InputConnector::node(mix, 2)).unwrap();
		(network, constant, mix)
	}

	#[test]
	fn disconnect_restores_default() {
		let (mut network, _, mix) = mix_network();
		network.disconnect(InputConnector::node(mix, 2)).unwrap();
		assert_eq!(network.node(mix).unwrap().inputs[2], NodeInput::value(TaggedValue::F32(0.25)));
		// Disconnecting twice is harmless
		network.disconnect(InputConnector::node(mix, 2)).unwrap();
	}

	#[test]
	fn remove_node_unlinks_consumers() {
		let (mut network, constant, mix) = mix_network();
		network.remove_node(constant).unwrap();
		assert!(network.consumers(OutputConnector::node(constant, 0)).is_empty());
		assert!(!network.node(mix).unwrap().inputs[2].is_linked());
		assert_eq!(network.remove_node(constant), Err(GraphError::NodeNotFound(constant)));
	}

	#[test]
	fn connect_out_of_range() {
		let (mut network, constant, mix) = mix_network();
		assert_eq!(
			network.connect(OutputConnector::node(constant, 3), InputConnector::node(mix, 0)),
			Err(GraphError::OutputOutOfRange { node_id: constant, output_index: 3 })
		);
		assert_eq!(
			network.connect(OutputConnector::node(constant, 0), InputConnector::node(mix, 7)),
			Err(GraphError::InputOutOfRange { node_id: mix, input_index: 7 })
		);
	}

	#[test]
	fn names_and_lookup() {
		let (mut network, constant, mix) = mix_network();
		network.rename(constant, "COLOR_VALUE_0").unwrap();
		network.rename(mix, "COLOR_VALUE_0").unwrap();
		assert_eq!(network.nodes_named("COLOR_VALUE_0").len(), 2);
		network.rename(mix, "COLOR_MIX_0").unwrap();
		assert_eq!(network.find_by_name("COLOR_MIX_0"), Some(mix));
		assert_eq!(network.find_by_name("COLOR_MIX_1"), None);
	}

	#[test]
	fn duplicate_remaps_internal_links() {
		let (mut network, constant, mix) = mix_network();
		let outside = network.create_node(NodeKind::Constant).unwrap();
		network.connect(OutputConnector::node(outside, 0), InputConnector::node(mix, 0)).unwrap();

		let copies = network.duplicate_nodes(&[constant, mix]).unwrap();
		let mix_copy = network.node(copies[&mix]).unwrap();
		assert_eq!(mix_copy.inputs[2], NodeInput::node(copies[&constant], 0));
		assert_eq!(mix_copy.inputs[0], NodeInput::node(outside, 0));
	}

	#[test]
	fn replace_template_drops_missing_outputs() {
		let mut network = NodeNetwork::default();
		let wide = network.register_template(NodeTemplate::new("Wide").with_output("A").with_output("B").with_output("C"));
		let narrow = network.register_template(NodeTemplate::new("Narrow").with_output("A"));
		let group = network.instantiate_template(wide).unwrap();
		let mix = network.create_node(NodeKind::Mix { blend_mode: BlendMode::Mix }).unwrap();
		network.connect(OutputConnector::node(group, 0), InputConnector::node(mix, 1)).unwrap();
		network.connect(OutputConnector::node(group, 2), InputConnector::node(mix, 2)).unwrap();

		network.replace_template(group, narrow).unwrap();
		let mix = network.node(mix).unwrap();
		assert!(mix.inputs[1].is_linked());
		assert!(!mix.inputs[2].is_linked());
		assert_eq!(network.node(group).unwrap().outputs, 1);
	}
}
