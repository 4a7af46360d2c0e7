use super::channel_router::{Route, route_image_alpha, route_output_channel};
use super::mask_builder::check_mask_projection;
use super::modify_stack_context::ModifyStackContext;
use super::node_definitions::{self, AXIS_MASK, BLUR_NOISE, CURVATURE, NORMAL, NORMAL_ROTATION_FIX, ROTATION, SHARPNESS, SIGNED_GEOMETRY_NORMAL, TRIPLANAR_AXES, VALUE, VECTOR};
use super::sub_graph::{self, SourceNaming, SourceOwner, column};
use crate::error::StackError;
use crate::messages::material::utility_types::naming::LayerNode;
use crate::messages::material::utility_types::stack::{Layer, Mask, ProjectionMode, SourceNodes};

use material_graph::{InputConnector, NodeId, OutputConnector, TaggedValue, TemplateId};

/// Points a projection node at another projection template, keeping the values of inputs both templates share.
fn swap_projection_template(context: &mut ModifyStackContext, projection: NodeId, template: TemplateId) -> Result<(), StackError> {
	let node = context.node(projection)?;
	let preserved = match node.kind.template().and_then(|current| context.network.template(current)) {
		Some(current) => current
			.inputs
			.iter()
			.zip(&node.inputs)
			.filter_map(|((socket, _), input)| Some((socket.clone(), input.as_value()?.clone())))
			.collect::<Vec<(String, TaggedValue)>>(),
		None => Vec::new(),
	};

	context.network.replace_template(projection, template)?;
	for (socket, value) in preserved {
		if let Some(input) = context.find_input_socket(projection, &socket) {
			context.set_input_value(input, value)?;
		}
	}
	Ok(())
}

/// Checks the projection and blend templates expose every socket a source is wired through, before anything is restructured.
fn check_source_sockets(context: &ModifyStackContext, projection_template: TemplateId, blend_template: Option<TemplateId>, mut projected: Vec<&str>, normal: bool) -> Result<(), StackError> {
	match blend_template {
		Some(blend_template) => {
			projected.extend(TRIPLANAR_AXES);
			projected.extend([AXIS_MASK, ROTATION]);
			let samples = (0..TRIPLANAR_AXES.len())
				.flat_map(|sample| [node_definitions::triplanar_color_input(sample), node_definitions::triplanar_alpha_input(sample)])
				.collect::<Vec<_>>();
			let mut inputs = samples.iter().map(String::as_str).collect::<Vec<_>>();
			inputs.extend([AXIS_MASK, ROTATION, SHARPNESS]);
			if normal {
				projected.push(SIGNED_GEOMETRY_NORMAL);
				inputs.push(SIGNED_GEOMETRY_NORMAL);
			}
			context.check_sockets(blend_template, &inputs, &[])?;
		}
		None => projected.push(VECTOR),
	}
	context.check_sockets(projection_template, &[], &projected)
}

/// Moves a source in or out of triplanar sampling, then rewires its samples to the projection.
fn switch_source(
	context: &mut ModifyStackContext,
	naming: &SourceNaming,
	source: &mut SourceNodes,
	projection: ProjectionMode,
	blend_template: Option<TemplateId>,
	projection_node: NodeId,
	vector_source: NodeId,
	normal: bool,
) -> Result<(), StackError> {
	match (projection, blend_template) {
		(ProjectionMode::Triplanar, Some(blend_template)) => sub_graph::enter_triplanar(context, naming, source, blend_template)?,
		_ => sub_graph::leave_triplanar(context, naming, source)?,
	}
	sub_graph::wire_source(context, source, projection_node, vector_source, normal)
}

/// Switches the projection of a layer, restructuring the source of every channel and rerouting each channel's recorded output channel.
///
/// Decal projection has no UV or triplanar counterpart, so transitions into and out of it are rejected.
pub fn set_layer_projection(context: &mut ModifyStackContext, layer: &mut Layer, layer_index: usize, projection: ProjectionMode) -> Result<(), StackError> {
	let from = layer.projection_mode;
	if from == projection {
		return Ok(());
	}
	if from == ProjectionMode::Decal || projection == ProjectionMode::Decal {
		return Err(StackError::InvalidProjectionTransition { from, to: projection });
	}

	let has_normal = layer.channels.iter().any(|channel| channel.normal);
	let projection_template = context.template(node_definitions::projection_template(projection))?;
	let (blend_template, normal_blend_template) = match projection {
		ProjectionMode::Triplanar => (
			Some(context.template(node_definitions::triplanar_blend_template(false))?),
			has_normal.then(|| context.template(node_definitions::triplanar_blend_template(true))).transpose()?,
		),
		_ => (None, None),
	};
	let rotation_fix_template = (projection == ProjectionMode::UV && has_normal).then(|| context.template(NORMAL_ROTATION_FIX)).transpose()?;

	check_source_sockets(context, projection_template, blend_template, Vec::new(), false)?;
	if let Some(normal_blend_template) = normal_blend_template {
		check_source_sockets(context, projection_template, Some(normal_blend_template), Vec::new(), true)?;
	}
	if let Some(rotation_fix_template) = rotation_fix_template {
		context.check_sockets(rotation_fix_template, &[NORMAL, ROTATION], &[NORMAL])?;
		context.check_sockets(projection_template, &[], &[ROTATION])?;
	}
	let sinks = layer.channels.iter().map(|channel| context.input_socket(channel.nodes.filter, VALUE)).collect::<Result<Vec<_>, _>>()?;

	// The structure about to change is what encodes the output channels, so read them first
	let recorded = layer.channels.iter().map(|channel| channel.output_channel).collect::<Vec<_>>();

	let projection_node = layer.projection;
	swap_projection_template(context, projection_node, projection_template)?;

	let row = context.layer_row(layer_index);
	for (channel_index, ((channel, output_channel), sink)) in layer.channels.iter_mut().zip(recorded).zip(sinks).enumerate() {
		let name = channel.name.clone();
		let naming = SourceNaming {
			owner: SourceOwner::Channel { layer: layer_index, channel: &name },
			dirty: false,
			row: row + channel_index as i32,
		};
		let blend_template = if channel.normal { normal_blend_template } else { blend_template };
		switch_source(context, &naming, &mut channel.nodes.source, projection, blend_template, projection_node, projection_node, channel.normal)?;

		match (rotation_fix_template.filter(|_| channel.normal), channel.nodes.rotation_fix) {
			(Some(template), None) => {
				let node = LayerNode::RotationFix(&name);
				let position = context.position(column::ROTATION_FIX, naming.row);
				let rotation_fix = context.network.instantiate_template(template)?;
				context.network.rename(rotation_fix, &node.name(layer_index))?;
				context.network.set_label(rotation_fix, &node.label())?;
				context.network.set_position(rotation_fix, position)?;
				channel.nodes.rotation_fix = Some(rotation_fix);
			}
			(None, Some(rotation_fix)) => {
				context.network.remove_node(rotation_fix)?;
				channel.nodes.rotation_fix = None;
			}
			_ => {}
		}

		let route = Route {
			source: &mut channel.nodes.source,
			naming,
			rotation_fix: channel.nodes.rotation_fix,
			projection: projection_node,
			sink,
		};
		channel.output_channel = route_output_channel(context, route, output_channel)?;
		route_image_alpha(context, channel)?;
	}

	layer.projection_mode = projection;
	debug!("Switched layer {layer_index} from {from} to {projection} projection");
	Ok(())
}

/// Switches the projection of a mask. Masks only switch between UV and triplanar, decal masks not at all.
pub fn set_mask_projection(context: &mut ModifyStackContext, mask: &mut Mask, layer_index: usize, mask_index: usize, projection: ProjectionMode) -> Result<(), StackError> {
	let from = mask.projection_mode;
	if from == projection {
		return Ok(());
	}
	check_mask_projection(mask.kind, from, projection)?;

	let (projection_template, blend_template) = sub_graph::resolve_projection_templates(context, projection, false)?;
	check_source_sockets(context, projection_template, blend_template, vec![BLUR_NOISE], false)?;
	let sink = context.input_socket(mask.nodes.filter, VALUE)?;
	let blur_noise_input = context.input_socket(mask.nodes.filter, BLUR_NOISE)?;
	let curvature = match (mask.nodes.mesh_map, mask.nodes.source.values.first()) {
		(Some(_), Some(&value)) => Some(context.input_socket(value, CURVATURE)?.input_index),
		_ => None,
	};
	let recorded = mask.output_channel;

	let projection_node = mask.nodes.projection;
	swap_projection_template(context, projection_node, projection_template)?;

	let naming = SourceNaming {
		owner: SourceOwner::Mask { layer: layer_index, mask: mask_index },
		dirty: false,
		row: context.mask_row(layer_index, mask_index),
	};
	let vector_source = mask.nodes.decal.unwrap_or(projection_node);
	switch_source(context, &naming, &mut mask.nodes.source, projection, blend_template, projection_node, vector_source, false)?;

	// Copied samples only keep their unlinked values
	if let (Some(mesh_map), Some(curvature)) = (mask.nodes.mesh_map, curvature) {
		for &value in &mask.nodes.source.values {
			context.connect(OutputConnector::node(mesh_map, 0), InputConnector::node(value, curvature))?;
		}
	}
	let blur_noise = context.output_socket(projection_node, BLUR_NOISE)?;
	context.connect(blur_noise, blur_noise_input)?;

	let route = Route {
		source: &mut mask.nodes.source,
		naming,
		rotation_fix: None,
		projection: projection_node,
		sink,
	};
	mask.output_channel = route_output_channel(context, route, recorded)?;
	mask.projection_mode = projection;
	debug!("Switched mask {mask_index} of layer {layer_index} from {from} to {projection} projection");
	Ok(())
}
