use crate::consts::{MATERIAL_OUTPUT_NAME, MATERIAL_SHADER_NAME};
use crate::error::StackError;
use crate::messages::material::utility_types::stack::LayerStack;

use material_graph::{GraphBackend, NodeId};

/// Checks that every node is present, carries its expected name, and is the only node with that name.
pub fn validate_names(network: &dyn GraphBackend, named: impl IntoIterator<Item = (NodeId, String)>) -> Result<(), StackError> {
	for (node_id, name) in named {
		if network.node(node_id).is_none_or(|node| node.name != name) {
			log::error!("Expected node \"{name}\" is missing, the stack must be refreshed");
			return Err(StackError::MissingNode { name });
		}
		if network.nodes_named(&name).len() > 1 {
			log::error!("Node name \"{name}\" is used more than once, the stack must be refreshed");
			return Err(StackError::DuplicateName { name });
		}
	}
	Ok(())
}

/// Checks the whole stack against the network before an operation edits anything.
pub fn validate_stack(network: &dyn GraphBackend, stack: &LayerStack) -> Result<(), StackError> {
	if let Some(root) = stack.root {
		validate_names(network, [(root.shader, MATERIAL_SHADER_NAME.to_string()), (root.output, MATERIAL_OUTPUT_NAME.to_string())])?;
	}
	for (index, layer) in stack.layers.iter().enumerate() {
		validate_names(network, layer.named_nodes(index))?;
	}
	Ok(())
}
