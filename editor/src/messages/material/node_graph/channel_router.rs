use super::modify_stack_context::ModifyStackContext;
use super::node_definitions::{NORMAL, ROTATION};
use super::sub_graph::{self, SourceNaming, column};
use crate::error::StackError;
use crate::messages::material::utility_types::stack::{Channel, OutputChannel, SourceNodes};

use material_graph::{GraphBackend, InputConnector, NodeId, NodeKind, OutputConnector};

/// The part of a sub-graph between a source and the node consuming it.
pub struct Route<'a, 'b> {
	pub source: &'a mut SourceNodes,
	pub naming: SourceNaming<'b>,
	/// The corrective stage of a normal channel under UV projection, placed right before `sink`.
	pub rotation_fix: Option<NodeId>,
	pub projection: NodeId,
	/// The filter input receiving the routed value.
	pub sink: InputConnector,
}

/// Checks that `requested` can be read from a source.
pub fn validate_output_channel(is_image: bool, requested: OutputChannel) -> Result<OutputChannel, StackError> {
	if requested == OutputChannel::Alpha && !is_image {
		return Err(StackError::IncompatibleOutputChannel { requested });
	}
	Ok(requested)
}

/// Rewires the source of a route so `requested` reaches the sink, returning the output channel actually used.
///
/// Alpha is only available on image sources, other sources fall back to Color.
pub fn route_output_channel(context: &mut ModifyStackContext, route: Route, requested: OutputChannel) -> Result<OutputChannel, StackError> {
	let is_image = sub_graph::source_is_image(context, route.source);
	let output_channel = validate_output_channel(is_image, requested).or_else(|error| match error {
		StackError::IncompatibleOutputChannel { requested } => {
			warn!("{requested} is not available on a non-image source, using {} instead", OutputChannel::Color);
			Ok(OutputChannel::Color)
		}
		error => Err(error),
	})?;

	let source = route.source.source().ok_or_else(|| StackError::MissingNode { name: route.naming.value(None).0 })?;
	let source_output = match output_channel {
		OutputChannel::Alpha => 1,
		_ => 0,
	};

	let mut upstream = OutputConnector::node(source, source_output);
	match (output_channel.separator_output(), route.source.separate) {
		(Some(separator_output), Some(separate)) => {
			context.connect(upstream, InputConnector::node(separate, 0))?;
			upstream = OutputConnector::node(separate, separator_output);
		}
		(Some(separator_output), None) => {
			let (name, label) = route.naming.separate();
			let position = route.naming.position(context, column::SEPARATE);
			let separate = context.network.create_node(NodeKind::SeparateColor)?;
			route.source.separate = Some(separate);
			context.network.rename(separate, &name)?;
			context.network.set_label(separate, &label)?;
			context.network.set_position(separate, position)?;
			context.connect(upstream, InputConnector::node(separate, 0))?;
			upstream = OutputConnector::node(separate, separator_output);
		}
		(None, Some(separate)) => {
			context.network.remove_node(separate)?;
			route.source.separate = None;
		}
		(None, None) => {}
	}

	if let Some(rotation_fix) = route.rotation_fix {
		let normal = context.input_socket(rotation_fix, NORMAL)?;
		context.disconnect(normal)?;
		context.connect(upstream, normal)?;
		let rotation = context.output_socket(route.projection, ROTATION)?;
		let rotation_input = context.input_socket(rotation_fix, ROTATION)?;
		context.connect(rotation, rotation_input)?;
		upstream = context.output_socket(rotation_fix, NORMAL)?;
	}

	context.disconnect(route.sink)?;
	context.connect(upstream, route.sink)?;
	debug!("Routed {output_channel} of node {source} into node {}", route.sink.node_id);
	Ok(output_channel)
}

/// The output channel a route currently reads, recovered from the edge entering the first stage after its source.
pub fn read_output_channel(network: &dyn GraphBackend, source: &SourceNodes, rotation_fix: Option<NodeId>, sink: InputConnector) -> Option<OutputChannel> {
	let entry = match rotation_fix {
		Some(rotation_fix) => {
			let template = network.template(network.node(rotation_fix)?.kind.template()?)?;
			InputConnector::node(rotation_fix, template.input_index(NORMAL)?)
		}
		None => sink,
	};
	let upstream = network.node(entry.node_id)?.inputs.get(entry.input_index)?.as_upstream()?;
	if Some(upstream.node_id) == source.separate {
		return [OutputChannel::Red, OutputChannel::Green, OutputChannel::Blue].get(upstream.output_index).copied();
	}
	Some(if upstream.output_index == 1 { OutputChannel::Alpha } else { OutputChannel::Color })
}

/// Feeds the alpha of the channel's image source into the channel opacity when image alpha blending is enabled, otherwise restores the constant opacity.
///
/// Returns whether alpha blending is in effect. Non-image sources have no alpha, so the setting is dropped for them.
pub fn route_image_alpha(context: &mut ModifyStackContext, channel: &mut Channel) -> Result<bool, StackError> {
	let input = InputConnector::node(channel.nodes.opacity, 1);
	context.disconnect(input)?;
	if !channel.image_alpha_blend_enabled {
		return Ok(false);
	}
	if !sub_graph::source_is_image(context, &channel.nodes.source) {
		warn!("The {} channel has no image to take alpha from, disabling image alpha blending", channel.name);
		channel.image_alpha_blend_enabled = false;
		return Ok(false);
	}

	let source = channel.nodes.source.source().ok_or_else(|| StackError::MissingNode {
		name: format!("{} source", channel.name),
	})?;
	context.connect(OutputConnector::node(source, 1), input)?;
	Ok(true)
}
