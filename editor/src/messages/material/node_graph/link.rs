use super::modify_stack_context::ModifyStackContext;
use crate::error::StackError;
use crate::messages::material::utility_types::stack::{Layer, LayerStack, MaterialRoot};

use material_graph::{InputConnector, OutputConnector};

/// The principal sockets of one stack entry. Layers have one lane per channel, masks a single lane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackLinks {
	pub active: bool,
	pub outputs: Vec<OutputConnector>,
	pub inputs: Vec<InputConnector>,
}

/// Chains every active entry into the next active entry above it, and the topmost active entry into the sinks.
///
/// Every principal input and every sink is unlinked first, so relinking an unchanged stack yields the same edges.
pub fn link_entries(context: &mut ModifyStackContext, entries: &[StackLinks], sinks: &[InputConnector]) -> Result<(), StackError> {
	for input in entries.iter().flat_map(|entry| entry.inputs.iter()).chain(sinks) {
		context.disconnect(*input)?;
	}

	let active = entries.iter().enumerate().filter(|(_, entry)| entry.active).map(|(index, _)| index).collect::<Vec<_>>();
	for (position, &index) in active.iter().enumerate() {
		let targets: &[InputConnector] = match active.get(position + 1) {
			Some(&next) => &entries[next].inputs,
			None => sinks,
		};
		for (&output, &input) in entries[index].outputs.iter().zip(targets) {
			context.connect(output, input)?;
		}
	}
	trace!("Linked {} of {} entries", active.len(), entries.len());
	Ok(())
}

pub fn layer_links(layer: &Layer) -> StackLinks {
	StackLinks {
		active: layer.active,
		outputs: layer.channels.iter().map(|channel| OutputConnector::node(channel.nodes.mix, 0)).collect(),
		inputs: layer.channels.iter().map(|channel| InputConnector::node(channel.nodes.mix, 1)).collect(),
	}
}

pub fn shader_sinks(root: &MaterialRoot, channels: usize) -> Vec<InputConnector> {
	(0..channels).map(|channel| InputConnector::node(root.shader, channel)).collect()
}

/// Links the layers of a material into its shader.
pub fn link_layers(context: &mut ModifyStackContext, stack: &LayerStack) -> Result<(), StackError> {
	let Some(root) = stack.root else {
		return Ok(());
	};
	let entries = stack.layers.iter().map(layer_links).collect::<Vec<_>>();
	link_entries(context, &entries, &shader_sinks(&root, context.schema.len()))
}

/// Links the masks of a layer into the layer's mask input.
pub fn link_masks(context: &mut ModifyStackContext, layer: &Layer) -> Result<(), StackError> {
	let entries = layer
		.masks
		.masks
		.iter()
		.map(|mask| StackLinks {
			active: !mask.hidden,
			outputs: vec![OutputConnector::node(mask.nodes.mix, 0)],
			inputs: vec![InputConnector::node(mask.nodes.mix, 1)],
		})
		.collect::<Vec<_>>();
	link_entries(context, &entries, &[InputConnector::node(layer.opacity, 1)])
}
