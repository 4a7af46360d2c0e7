//! Rebuilds the in-memory stacks of a material from the names of its nodes. Entries are counted upward from index 0 until a name is missing.

use super::channel_router::read_output_channel;
use super::node_definitions::{self, OBJECT, VALUE};
use crate::consts::{MATERIAL_OUTPUT_NAME, MATERIAL_SHADER_NAME, TRIPLANAR_SAMPLES};
use crate::error::StackError;
use crate::messages::material::utility_types::channel_schema::{ChannelDefinition, ChannelSchema};
use crate::messages::material::utility_types::naming::{LayerNode, MaskNode};
use crate::messages::material::utility_types::stack::*;

use material_graph::{GraphBackend, InputConnector, NodeId, NodeKind, ObjectId};

/// Looks up a node by name, failing if more than one node carries it.
fn lookup(network: &dyn GraphBackend, name: String) -> Result<Option<NodeId>, StackError> {
	match network.nodes_named(&name).as_slice() {
		[] => Ok(None),
		[node_id] => Ok(Some(*node_id)),
		_ => Err(StackError::DuplicateName { name }),
	}
}

fn require(network: &dyn GraphBackend, name: String) -> Result<NodeId, StackError> {
	let missing = StackError::MissingNode { name: name.clone() };
	lookup(network, name)?.ok_or(missing)
}

fn group_input(network: &dyn GraphBackend, node_id: NodeId, socket: &str) -> Option<InputConnector> {
	let template = network.template(network.node(node_id)?.kind.template()?)?;
	template.input_index(socket).map(|input_index| InputConnector::node(node_id, input_index))
}

fn projection_mode(network: &dyn GraphBackend, projection: NodeId) -> Result<ProjectionMode, StackError> {
	let template = network.node(projection).and_then(|node| network.template(node.kind.template()?));
	let name = template.map(|template| template.name.clone()).unwrap_or_default();
	node_definitions::projection_mode_of(&name).ok_or(StackError::MissingTemplate(name))
}

fn anchor(network: &dyn GraphBackend, projection: NodeId) -> Option<ObjectId> {
	let input = group_input(network, projection, OBJECT)?;
	network.node(projection)?.inputs.get(input.input_index)?.as_value()?.as_object()
}

fn is_muted(network: &dyn GraphBackend, node_id: NodeId) -> bool {
	network.node(node_id).is_some_and(|node| node.muted)
}

fn read_values(network: &dyn GraphBackend, projection: ProjectionMode, name: impl Fn(Option<usize>) -> String) -> Result<Vec<NodeId>, StackError> {
	match projection {
		ProjectionMode::Triplanar => (0..TRIPLANAR_SAMPLES).map(|sample| require(network, name(Some(sample)))).collect(),
		_ => Ok(vec![require(network, name(None))?]),
	}
}

fn read_channel(network: &dyn GraphBackend, layer: usize, definition: &ChannelDefinition, projection: ProjectionMode) -> Result<Channel, StackError> {
	let channel = definition.name.as_str();
	let source = SourceNodes {
		values: read_values(network, projection, |sample| LayerNode::Value { channel, sample }.name(layer))?,
		triplanar_blend: lookup(network, LayerNode::TriplanarBlend(channel).name(layer))?,
		separate: lookup(network, LayerNode::Separate(channel).name(layer))?,
	};
	let rotation_fix = lookup(network, LayerNode::RotationFix(channel).name(layer))?;
	let filter = require(network, LayerNode::Filter(channel).name(layer))?;
	let opacity = require(network, LayerNode::ChannelOpacity(channel).name(layer))?;
	let mix = require(network, LayerNode::Mix(channel).name(layer))?;

	let sink = group_input(network, filter, VALUE).unwrap_or(InputConnector::node(filter, 0));
	let blend_mode = match network.node(mix).map(|node| &node.kind) {
		Some(NodeKind::Mix { blend_mode }) => *blend_mode,
		_ => definition.default_blend_mode,
	};
	let image_alpha_blend_enabled = network.node(opacity).and_then(|node| node.inputs.get(1)).is_some_and(|input| input.is_linked());

	Ok(Channel {
		name: definition.name.clone(),
		normal: definition.is_normal(),
		filter_active: !is_muted(network, filter),
		blend_mode,
		output_channel: read_output_channel(network, &source, rotation_fix, sink).unwrap_or_default(),
		image_alpha_blend_enabled,
		nodes: ChannelNodes {
			source,
			rotation_fix,
			filter,
			opacity,
			mix,
		},
	})
}

fn read_mask(network: &dyn GraphBackend, layer: usize, mask: usize) -> Result<Option<Mask>, StackError> {
	let Some(projection) = lookup(network, MaskNode::Projection.name(layer, mask))? else {
		return Ok(None);
	};
	let label = network.node(projection).map(|node| node.label.clone()).unwrap_or_default();
	let kind = label.parse::<MaskKind>().unwrap_or_else(|_| {
		warn!("Mask {mask} of layer {layer} has an unknown kind \"{label}\", reading it as {}", MaskKind::Empty);
		MaskKind::Empty
	});
	let projection_mode = projection_mode(network, projection)?;

	let source = SourceNodes {
		values: read_values(network, projection_mode, |sample| MaskNode::Value { sample }.name(layer, mask))?,
		triplanar_blend: lookup(network, MaskNode::TriplanarBlend.name(layer, mask))?,
		separate: lookup(network, MaskNode::Separate.name(layer, mask))?,
	};
	let decal = lookup(network, MaskNode::Decal.name(layer, mask))?;
	let mesh_map = lookup(network, MaskNode::MeshMap.name(layer, mask))?;
	let filter = require(network, MaskNode::Filter.name(layer, mask))?;
	let mix = require(network, MaskNode::Mix.name(layer, mask))?;
	let sink = group_input(network, filter, VALUE).unwrap_or(InputConnector::node(filter, 0));

	Ok(Some(Mask {
		kind,
		projection_mode,
		output_channel: read_output_channel(network, &source, None, sink).unwrap_or_default(),
		hidden: is_muted(network, mix),
		decal_anchor: decal.and_then(|decal| anchor(network, decal)),
		nodes: MaskNodes {
			projection,
			source,
			decal,
			mesh_map,
			filter,
			mix,
		},
	}))
}

fn read_layer(network: &dyn GraphBackend, schema: &ChannelSchema, layer: usize) -> Result<Option<Layer>, StackError> {
	let Some(projection) = lookup(network, LayerNode::Projection.name(layer))? else {
		return Ok(None);
	};
	let label = network.node(projection).map(|node| node.label.clone()).unwrap_or_default();
	let kind = label.parse::<LayerKind>().unwrap_or_else(|_| {
		warn!("Layer {layer} has an unknown kind \"{label}\", reading it as {}", LayerKind::Material);
		LayerKind::Material
	});
	let projection_mode = projection_mode(network, projection)?;
	let opacity = require(network, LayerNode::Opacity.name(layer))?;

	let channels = schema
		.channels()
		.iter()
		.map(|definition| read_channel(network, layer, definition, projection_mode))
		.collect::<Result<Vec<_>, _>>()?;

	let mut masks = Vec::new();
	while let Some(mask) = read_mask(network, layer, masks.len())? {
		masks.push(mask);
	}

	Ok(Some(Layer {
		kind,
		active: !is_muted(network, opacity),
		projection_mode,
		decal_anchor: anchor(network, projection),
		projection,
		opacity,
		decal_mask: lookup(network, LayerNode::DecalMask.name(layer))?,
		channels,
		masks: MaskStack { masks, selected: None },
	}))
}

/// Reads the layer stack of the material in `network`. A material without a shader has an empty stack.
pub fn refresh_stack(network: &dyn GraphBackend, schema: &ChannelSchema) -> Result<LayerStack, StackError> {
	let Some(shader) = lookup(network, MATERIAL_SHADER_NAME.to_string())? else {
		return Ok(LayerStack::default());
	};
	let output = require(network, MATERIAL_OUTPUT_NAME.to_string())?;

	let mut layers = Vec::new();
	while let Some(layer) = read_layer(network, schema, layers.len())? {
		layers.push(layer);
	}
	debug!("Refreshed a stack of {} layers", layers.len());

	Ok(LayerStack {
		layers,
		selected: None,
		root: Some(MaterialRoot { shader, output }),
	})
}
