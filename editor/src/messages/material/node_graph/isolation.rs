//! Previewing a single contribution of the material, by routing it through an emission shader straight into the material output.
//! Isolation lives in the handler only. The stack itself never records it.

use super::modify_stack_context::ModifyStackContext;
use super::node_definitions;
use super::sub_graph::column;
use crate::consts::{MESH_MAP_BAKE_NAME, PREVIEW_EMISSION_NAME};
use crate::error::StackError;
use crate::messages::material::utility_types::stack::{LayerStack, MaterialRoot, MeshMapType};

use glam::Vec4;
use material_graph::{InputConnector, NodeId, NodeKind, OutputConnector, TaggedValue};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Isolation {
	/// The combined value of one material channel across every active layer.
	Channel { channel: String },
	/// The output of one mask.
	Mask { layer: usize, mask: usize },
	/// A mesh map bake template, used while baking mesh maps.
	MeshMap { map: MeshMapType },
}

/// Finds a material-wide node by name, creating it when it does not exist yet.
fn find_or_create(context: &mut ModifyStackContext, name: &str, kind: NodeKind, label: &str, column: i32) -> Result<NodeId, StackError> {
	if let Some(node_id) = context.network.find_by_name(name) {
		return Ok(node_id);
	}
	let node_id = context.network.create_node(kind)?;
	let position = context.position(column, -1);
	context.network.rename(node_id, name)?;
	context.network.set_label(node_id, label)?;
	context.network.set_position(node_id, position)?;
	Ok(node_id)
}

fn remove_named(context: &mut ModifyStackContext, name: &str) -> Result<(), StackError> {
	if let Some(node_id) = context.network.find_by_name(name) {
		context.network.remove_node(node_id)?;
	}
	Ok(())
}

fn preview_color(value: &TaggedValue) -> TaggedValue {
	match value {
		TaggedValue::F32(value) => TaggedValue::Color(Vec4::new(*value, *value, *value, 1.)),
		TaggedValue::Color(color) => TaggedValue::Color(*color),
		_ => TaggedValue::Color(Vec4::new(0., 0., 0., 1.)),
	}
}

enum Contribution {
	Output(OutputConnector),
	/// Nothing contributes, so the preview shows this value.
	Value(TaggedValue),
}

fn isolated_contribution(context: &mut ModifyStackContext, stack: &LayerStack, isolation: &Isolation) -> Result<Contribution, StackError> {
	let contribution = match isolation {
		Isolation::Channel { channel } => {
			let channel_index = context.schema.index_of(channel)?;
			match stack.layers.iter().rev().find(|layer| layer.active) {
				Some(top) => Contribution::Output(OutputConnector::node(top.channels[channel_index].nodes.mix, 0)),
				None => Contribution::Value(context.schema.channels()[channel_index].default_value.tagged_value()),
			}
		}
		Isolation::Mask { layer, mask } => Contribution::Output(OutputConnector::node(stack.get(*layer)?.masks.get(*mask)?.nodes.mix, 0)),
		Isolation::MeshMap { map } => {
			let template = context.template(&node_definitions::mesh_map_bake_template(*map))?;
			let current = context.network.find_by_name(MESH_MAP_BAKE_NAME);
			if let Some(current) = current.filter(|current| context.network.node(*current).is_some_and(|node| node.kind.template() != Some(template))) {
				context.network.remove_node(current)?;
			}
			let bake = find_or_create(context, MESH_MAP_BAKE_NAME, NodeKind::Group { template }, &map.to_string(), column::MIX)?;
			Contribution::Output(OutputConnector::node(bake, 0))
		}
	};
	Ok(contribution)
}

/// Shows only the isolated contribution in the material output.
pub fn apply_isolation(context: &mut ModifyStackContext, stack: &LayerStack, root: MaterialRoot, isolation: &Isolation) -> Result<(), StackError> {
	let contribution = isolated_contribution(context, stack, isolation)?;
	if !matches!(isolation, Isolation::MeshMap { .. }) {
		remove_named(context, MESH_MAP_BAKE_NAME)?;
	}

	let emission = find_or_create(context, PREVIEW_EMISSION_NAME, NodeKind::Emission, "Preview", column::MIX + 1)?;
	let color = InputConnector::node(emission, 0);
	context.disconnect(color)?;
	match contribution {
		Contribution::Output(output) => context.connect(output, color)?,
		Contribution::Value(value) => context.set_input_value(color, preview_color(&value))?,
	}
	context.connect(OutputConnector::node(emission, 0), InputConnector::node(root.output, 0))?;
	debug!("Isolated {isolation:?}");
	Ok(())
}

/// Restores the shader as the material output and removes every preview node.
pub fn clear_isolation(context: &mut ModifyStackContext, root: MaterialRoot) -> Result<(), StackError> {
	context.connect(OutputConnector::node(root.shader, 0), InputConnector::node(root.output, 0))?;
	remove_named(context, PREVIEW_EMISSION_NAME)?;
	remove_named(context, MESH_MAP_BAKE_NAME)
}
