//! Pieces shared by the layer and mask builders: the value node(s) an entry samples, and how they are named, placed and wired to a projection.

use super::modify_stack_context::{ModifyStackContext, Staging};
use super::node_definitions::{self, AXIS_MASK, ROTATION, SHARPNESS, SIGNED_GEOMETRY_NORMAL, TRIPLANAR_AXES, VECTOR};
use crate::consts::TRIPLANAR_SAMPLES;
use crate::error::StackError;
use crate::messages::material::utility_types::naming::{LayerNode, MaskNode, dirty_name};
use crate::messages::material::utility_types::stack::{ProjectionMode, SourceNodes};

use glam::IVec2;
use material_graph::{ImageId, InputConnector, Interpolation, NodeId, NodeKind, OutputConnector, TaggedValue, TemplateId};

/// Grid columns of the nodes making up a sub-graph, from left to right.
pub mod column {
	pub const PROJECTION: i32 = 0;
	pub const VALUE: i32 = 1;
	pub const TRIPLANAR_BLEND: i32 = 2;
	pub const SEPARATE: i32 = 3;
	pub const ROTATION_FIX: i32 = 4;
	pub const FILTER: i32 = 5;
	pub const OPACITY: i32 = 6;
	pub const MIX: i32 = 7;
}

/// What a value node produces.
#[derive(Clone, Debug, PartialEq)]
pub enum ValueSource {
	Constant(TaggedValue),
	Texture(Option<ImageId>),
	Group(TemplateId),
}

/// The entry a source belongs to, which determines the names of its nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceOwner<'a> {
	Channel { layer: usize, channel: &'a str },
	Mask { layer: usize, mask: usize },
}

/// Names and places the nodes of a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceNaming<'a> {
	pub owner: SourceOwner<'a>,
	/// Entries under construction carry dirty names until the reindex plan assigns them their position.
	pub dirty: bool,
	pub row: i32,
}

impl SourceNaming<'_> {
	fn finish(&self, name: String) -> String {
		if self.dirty { dirty_name(&name) } else { name }
	}

	/// Name and label of a value node.
	pub fn value(&self, sample: Option<usize>) -> (String, String) {
		match self.owner {
			SourceOwner::Channel { layer, channel } => {
				let node = LayerNode::Value { channel, sample };
				(self.finish(node.name(layer)), node.label())
			}
			SourceOwner::Mask { layer, mask } => {
				let node = MaskNode::Value { sample };
				(self.finish(node.name(layer, mask)), node.label().to_string())
			}
		}
	}

	pub fn triplanar_blend(&self) -> (String, String) {
		match self.owner {
			SourceOwner::Channel { layer, channel } => (self.finish(LayerNode::TriplanarBlend(channel).name(layer)), LayerNode::TriplanarBlend(channel).label()),
			SourceOwner::Mask { layer, mask } => (self.finish(MaskNode::TriplanarBlend.name(layer, mask)), MaskNode::TriplanarBlend.label().to_string()),
		}
	}

	pub fn separate(&self) -> (String, String) {
		match self.owner {
			SourceOwner::Channel { layer, channel } => (self.finish(LayerNode::Separate(channel).name(layer)), LayerNode::Separate(channel).label()),
			SourceOwner::Mask { layer, mask } => (self.finish(MaskNode::Separate.name(layer, mask)), MaskNode::Separate.label().to_string()),
		}
	}

	pub fn position(&self, context: &ModifyStackContext, column: i32) -> IVec2 {
		context.position(column, self.row)
	}
}

fn value_kind(value: &ValueSource) -> NodeKind {
	match value {
		ValueSource::Constant(_) => NodeKind::Constant,
		ValueSource::Texture(image) => NodeKind::Texture {
			image: *image,
			interpolation: Interpolation::Linear,
		},
		ValueSource::Group(template) => NodeKind::Group { template: *template },
	}
}

fn create_value(context: &mut ModifyStackContext, staging: &mut Staging, naming: &SourceNaming, value: &ValueSource, sample: Option<usize>) -> Result<NodeId, StackError> {
	let (name, label) = naming.value(sample);
	let position = naming.position(context, column::VALUE);
	let node_id = staging.create_node(context, value_kind(value), &name, &label, position)?;
	if let ValueSource::Constant(constant) = value {
		context.set_input_value(InputConnector::node(node_id, 0), constant.clone())?;
	}
	Ok(node_id)
}

/// Creates the value node(s) of a source: one node, or three samples combined by `triplanar_blend`.
pub fn create_source(context: &mut ModifyStackContext, staging: &mut Staging, naming: &SourceNaming, value: &ValueSource, triplanar_blend: Option<TemplateId>) -> Result<SourceNodes, StackError> {
	let Some(blend_template) = triplanar_blend else {
		let value = create_value(context, staging, naming, value, None)?;
		return Ok(SourceNodes {
			values: vec![value],
			triplanar_blend: None,
			separate: None,
		});
	};

	let mut values = Vec::with_capacity(TRIPLANAR_SAMPLES);
	for sample in 0..TRIPLANAR_SAMPLES {
		values.push(create_value(context, staging, naming, value, Some(sample))?);
	}
	let (name, label) = naming.triplanar_blend();
	let position = naming.position(context, column::TRIPLANAR_BLEND);
	let blend = staging.instantiate(context, blend_template, &name, &label, position)?;
	Ok(SourceNodes {
		values,
		triplanar_blend: Some(blend),
		separate: None,
	})
}

fn stage_triplanar(context: &mut ModifyStackContext, staging: &mut Staging, naming: &SourceNaming, single: NodeId, blend_template: TemplateId) -> Result<(Vec<NodeId>, NodeId), StackError> {
	let position = context.node(single)?.metadata.position;
	let mut values = Vec::with_capacity(TRIPLANAR_SAMPLES);
	for sample in 0..TRIPLANAR_SAMPLES {
		let (name, label) = naming.value(Some(sample));
		values.push(staging.copy_node(context, single, &name, &label, position)?);
	}
	let (name, label) = naming.triplanar_blend();
	let position = naming.position(context, column::TRIPLANAR_BLEND);
	let blend = staging.instantiate(context, blend_template, &name, &label, position)?;
	Ok((values, blend))
}

/// Replaces the single value node of a source with three samples sampling the same thing, combined by a new blend node.
pub fn enter_triplanar(context: &mut ModifyStackContext, naming: &SourceNaming, source: &mut SourceNodes, blend_template: TemplateId) -> Result<(), StackError> {
	let [single] = source.values[..] else {
		return Ok(());
	};

	let mut staging = Staging::default();
	match stage_triplanar(context, &mut staging, naming, single, blend_template) {
		Ok((values, blend)) => {
			staging.commit();
			context.network.remove_node(single)?;
			source.values = values;
			source.triplanar_blend = Some(blend);
			Ok(())
		}
		Err(error) => {
			staging.discard(context.network);
			Err(error)
		}
	}
}

/// Collapses the triplanar samples of a source back to the first sample, which keeps its bound image and interpolation.
pub fn leave_triplanar(context: &mut ModifyStackContext, naming: &SourceNaming, source: &mut SourceNodes) -> Result<(), StackError> {
	let Some(blend) = source.triplanar_blend.take() else {
		return Ok(());
	};
	context.network.remove_node(blend)?;
	for extra in source.values.drain(1..) {
		context.network.remove_node(extra)?;
	}
	if let Some(&kept) = source.values.first() {
		let (name, label) = naming.value(None);
		context.network.rename(kept, &name)?;
		context.network.set_label(kept, &label)?;
	}
	Ok(())
}

/// The input of a value node reading projected coordinates, if it samples anything.
fn vector_input(context: &ModifyStackContext, node_id: NodeId) -> Result<Option<InputConnector>, StackError> {
	let input = match context.node(node_id)?.kind {
		NodeKind::Texture { .. } => Some(InputConnector::node(node_id, 0)),
		NodeKind::Group { .. } => context.find_input_socket(node_id, VECTOR),
		_ => None,
	};
	Ok(input)
}

/// Connects the value node(s) of a source to the projection.
///
/// `vector_source` provides the coordinates of a single value node. It is the projection itself, except for decal masks which sample through their own decal projection.
pub fn wire_source(context: &mut ModifyStackContext, source: &SourceNodes, projection: NodeId, vector_source: NodeId, normal: bool) -> Result<(), StackError> {
	let Some(blend) = source.triplanar_blend else {
		if let Some(&value) = source.values.first() {
			if let Some(input) = vector_input(context, value)? {
				let vector = context.output_socket(vector_source, VECTOR)?;
				context.connect(vector, input)?;
			}
		}
		return Ok(());
	};

	for (sample, &value) in source.values.iter().enumerate() {
		if let Some(input) = vector_input(context, value)? {
			let axis = context.output_socket(projection, TRIPLANAR_AXES[sample])?;
			context.connect(axis, input)?;
		}
		let color = context.input_socket(blend, &node_definitions::triplanar_color_input(sample))?;
		context.connect(OutputConnector::node(value, 0), color)?;

		let alpha = context.input_socket(blend, &node_definitions::triplanar_alpha_input(sample))?;
		if context.node(value)?.kind.is_image_sampling() {
			context.connect(OutputConnector::node(value, 1), alpha)?;
		} else {
			context.disconnect(alpha)?;
		}
	}

	let mut projected = vec![AXIS_MASK, ROTATION];
	if normal {
		projected.push(SIGNED_GEOMETRY_NORMAL);
	}
	for socket in projected {
		let output = context.output_socket(projection, socket)?;
		let input = context.input_socket(blend, socket)?;
		context.connect(output, input)?;
	}

	let sharpness = context.input_socket(blend, SHARPNESS)?;
	let blending = context.preferences.triplanar_blending;
	context.set_input_value(sharpness, TaggedValue::F32(blending))?;
	Ok(())
}

/// Image sources provide an alpha output. A triplanar blend over textures counts as an image.
pub fn source_is_image(context: &ModifyStackContext, source: &SourceNodes) -> bool {
	source
		.values
		.first()
		.and_then(|&value| context.network.node(value))
		.is_some_and(|node| node.kind.is_image_sampling())
}

/// The projection template for `projection`, and the blend template needed under triplanar projection.
pub fn resolve_projection_templates(context: &mut ModifyStackContext, projection: ProjectionMode, normal: bool) -> Result<(TemplateId, Option<TemplateId>), StackError> {
	let projection_template = context.template(node_definitions::projection_template(projection))?;
	let blend_template = match projection {
		ProjectionMode::Triplanar => Some(context.template(node_definitions::triplanar_blend_template(normal))?),
		_ => None,
	};
	Ok((projection_template, blend_template))
}
