use super::channel_router::{Route, route_output_channel};
use super::modify_stack_context::{ModifyStackContext, Staging};
use super::node_definitions::{self, CLIP, NORMAL_ROTATION_FIX, OBJECT, VALUE};
use super::sub_graph::{self, SourceNaming, SourceOwner, ValueSource, column};
use crate::error::StackError;
use crate::messages::material::utility_types::channel_schema::ChannelDefinition;
use crate::messages::material::utility_types::naming::{LayerNode, dirty_name};
use crate::messages::material::utility_types::stack::{Channel, ChannelNodes, Layer, LayerKind, MaskStack, OutputChannel, ProjectionMode};

use material_graph::{InputConnector, MathOperation, NodeId, NodeKind, ObjectId, OutputConnector, TaggedValue, TemplateId};

/// Every template a layer needs, resolved before the first node is created.
struct LayerTemplates {
	projection: TemplateId,
	triplanar_blend: Option<TemplateId>,
	triplanar_normal_blend: Option<TemplateId>,
	rotation_fix: Option<TemplateId>,
	/// One per schema channel.
	filters: Vec<TemplateId>,
}

impl LayerTemplates {
	fn resolve(context: &mut ModifyStackContext, projection: ProjectionMode) -> Result<Self, StackError> {
		let schema = context.schema;
		let has_normal = schema.channels().iter().any(ChannelDefinition::is_normal);
		let has_other = schema.channels().iter().any(|channel| !channel.is_normal());
		let triplanar = projection == ProjectionMode::Triplanar;

		Ok(Self {
			projection: context.template(node_definitions::projection_template(projection))?,
			triplanar_blend: (triplanar && has_other).then(|| context.template(node_definitions::triplanar_blend_template(false))).transpose()?,
			triplanar_normal_blend: (triplanar && has_normal).then(|| context.template(node_definitions::triplanar_blend_template(true))).transpose()?,
			rotation_fix: (projection == ProjectionMode::UV && has_normal).then(|| context.template(NORMAL_ROTATION_FIX)).transpose()?,
			filters: schema
				.channels()
				.iter()
				.map(|channel| context.template(node_definitions::filter_template(channel.data_type)))
				.collect::<Result<_, _>>()?,
		})
	}
}

/// What the value nodes of a new layer produce in a channel.
fn layer_value(context: &ModifyStackContext, kind: LayerKind, channel_index: usize, channel: &ChannelDefinition) -> ValueSource {
	match kind {
		LayerKind::Image | LayerKind::Decal if context.schema.base_color() == Some(channel_index) => ValueSource::Texture(context.preferences.placeholder_image),
		_ => ValueSource::Constant(channel.default_value.tagged_value()),
	}
}

/// Builds the sub-graph of a new layer with dirty names, ready to be inserted at index `layer`.
///
/// Every template is resolved first, and a build failing halfway removes what it created, so a failed build leaves the graph untouched.
pub fn build_layer(context: &mut ModifyStackContext, kind: LayerKind, layer: usize) -> Result<Layer, StackError> {
	let projection_mode = match kind {
		LayerKind::Decal => ProjectionMode::Decal,
		_ => context.preferences.new_entry_projection(),
	};
	let templates = LayerTemplates::resolve(context, projection_mode)?;
	let decal_anchor = (kind == LayerKind::Decal).then(|| context.scene.spawn_decal_anchor(&format!("Decal {layer}")));

	let mut staging = Staging::default();
	match build_layer_nodes(context, &mut staging, &templates, kind, projection_mode, decal_anchor, layer) {
		Ok(built) => {
			staging.commit();
			debug!("Built {kind} layer for index {layer}");
			Ok(built)
		}
		Err(error) => {
			staging.discard(context.network);
			if let Some(anchor) = decal_anchor {
				context.scene.remove_object(anchor)?;
			}
			Err(error)
		}
	}
}

fn build_layer_nodes(
	context: &mut ModifyStackContext,
	staging: &mut Staging,
	templates: &LayerTemplates,
	kind: LayerKind,
	projection_mode: ProjectionMode,
	decal_anchor: Option<ObjectId>,
	layer: usize,
) -> Result<Layer, StackError> {
	let row = context.layer_row(layer);
	let name = |node: LayerNode| dirty_name(&node.name(layer));

	// The projection's label records the kind of the layer
	let position = context.position(column::PROJECTION, row);
	let projection = staging.instantiate(context, templates.projection, &name(LayerNode::Projection), &kind.to_string(), position)?;
	if let Some(anchor) = decal_anchor {
		let object = context.input_socket(projection, OBJECT)?;
		context.set_input_value(object, TaggedValue::Object(Some(anchor)))?;
	}

	let position = context.position(column::PROJECTION, row + 1);
	let opacity = staging.create_node(
		context,
		NodeKind::Math { operation: MathOperation::Multiply },
		&name(LayerNode::Opacity),
		&LayerNode::Opacity.label(),
		position,
	)?;

	let decal_mask = match kind {
		LayerKind::Decal => {
			let position = context.position(column::PROJECTION, row + 2);
			let decal_mask = staging.create_node(
				context,
				NodeKind::Math { operation: MathOperation::Multiply },
				&name(LayerNode::DecalMask),
				&LayerNode::DecalMask.label(),
				position,
			)?;
			context.connect(OutputConnector::node(opacity, 0), InputConnector::node(decal_mask, 0))?;
			let clip = context.output_socket(projection, CLIP)?;
			context.connect(clip, InputConnector::node(decal_mask, 1))?;
			Some(decal_mask)
		}
		_ => None,
	};
	let factor = OutputConnector::node(decal_mask.unwrap_or(opacity), 0);

	let schema = context.schema;
	let mut channels = Vec::with_capacity(schema.len());
	for (channel_index, definition) in schema.channels().iter().enumerate() {
		let value = layer_value(context, kind, channel_index, definition);
		let blend = if definition.is_normal() { templates.triplanar_normal_blend } else { templates.triplanar_blend };
		let channel = ChannelBuild {
			layer,
			row: row + channel_index as i32,
			definition,
			value,
			filter_template: templates.filters[channel_index],
			triplanar_blend: blend,
			rotation_fix: templates.rotation_fix.filter(|_| definition.is_normal()),
			projection,
			factor,
		};
		channels.push(channel.build(context, staging)?);
	}

	Ok(Layer {
		kind,
		active: true,
		projection_mode,
		decal_anchor,
		projection,
		opacity,
		decal_mask,
		channels,
		masks: MaskStack::default(),
	})
}

/// The nodes of one channel: source, optional rotation fix, filter, channel opacity and mix.
struct ChannelBuild<'a> {
	layer: usize,
	row: i32,
	definition: &'a ChannelDefinition,
	value: ValueSource,
	filter_template: TemplateId,
	triplanar_blend: Option<TemplateId>,
	rotation_fix: Option<TemplateId>,
	projection: NodeId,
	/// Scales the contribution of the channel, either the layer opacity or the decal mask.
	factor: OutputConnector,
}

impl ChannelBuild<'_> {
	fn build(self, context: &mut ModifyStackContext, staging: &mut Staging) -> Result<Channel, StackError> {
		let layer = self.layer;
		let channel = self.definition.name.as_str();
		let naming = SourceNaming {
			owner: SourceOwner::Channel { layer, channel },
			dirty: true,
			row: self.row,
		};

		let mut source = sub_graph::create_source(context, staging, &naming, &self.value, self.triplanar_blend)?;
		sub_graph::wire_source(context, &source, self.projection, self.projection, self.definition.is_normal())?;

		let rotation_fix = match self.rotation_fix {
			Some(template) => {
				let position = context.position(column::ROTATION_FIX, self.row);
				let node = LayerNode::RotationFix(channel);
				Some(staging.instantiate(context, template, &dirty_name(&node.name(layer)), &node.label(), position)?)
			}
			None => None,
		};

		let position = context.position(column::FILTER, self.row);
		let filter = staging.instantiate(context, self.filter_template, &dirty_name(&LayerNode::Filter(channel).name(layer)), &LayerNode::Filter(channel).label(), position)?;

		let position = context.position(column::OPACITY, self.row);
		let opacity = staging.create_node(
			context,
			NodeKind::Math { operation: MathOperation::Multiply },
			&dirty_name(&LayerNode::ChannelOpacity(channel).name(layer)),
			&LayerNode::ChannelOpacity(channel).label(),
			position,
		)?;
		context.connect(self.factor, InputConnector::node(opacity, 0))?;

		let position = context.position(column::MIX, self.row);
		let blend_mode = self.definition.default_blend_mode;
		let mix = staging.create_node(context, NodeKind::Mix { blend_mode }, &dirty_name(&LayerNode::Mix(channel).name(layer)), &LayerNode::Mix(channel).label(), position)?;
		// Below the bottom layer a channel falls back to its default value
		context.set_input_value(InputConnector::node(mix, 1), self.definition.default_value.tagged_value())?;
		context.connect(OutputConnector::node(opacity, 0), InputConnector::node(mix, 0))?;
		context.connect(OutputConnector::node(filter, 0), InputConnector::node(mix, 2))?;

		let sink = context.input_socket(filter, VALUE)?;
		let route = Route {
			source: &mut source,
			naming,
			rotation_fix,
			projection: self.projection,
			sink,
		};
		let output_channel = route_output_channel(context, route, OutputChannel::Color)?;

		Ok(Channel {
			name: self.definition.name.clone(),
			normal: self.definition.is_normal(),
			filter_active: true,
			blend_mode,
			output_channel,
			image_alpha_blend_enabled: false,
			nodes: ChannelNodes {
				source,
				rotation_fix,
				filter,
				opacity,
				mix,
			},
		})
	}
}
