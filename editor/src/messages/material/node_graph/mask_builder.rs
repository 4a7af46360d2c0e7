use super::channel_router::{Route, route_output_channel};
use super::modify_stack_context::{ModifyStackContext, Staging};
use super::node_definitions::{BLUR_NOISE, CURVATURE, DECAL_PROJECTION, EDGE_WEAR, LINEAR_GRADIENT, MASK_FILTER, OBJECT, VALUE};
use super::sub_graph::{self, SourceNaming, SourceOwner, ValueSource, column};
use crate::error::StackError;
use crate::messages::material::utility_types::mesh_maps::MeshMaps;
use crate::messages::material::utility_types::naming::{MaskNode, dirty_name};
use crate::messages::material::utility_types::stack::{Mask, MaskKind, MaskNodes, MeshMapType, OutputChannel, ProjectionMode};

use material_graph::{BlendMode, InputConnector, Interpolation, NodeKind, ObjectId, OutputConnector, TaggedValue, TemplateId};

/// Every template a mask needs, resolved before the first node is created.
struct MaskTemplates {
	projection: TemplateId,
	triplanar_blend: Option<TemplateId>,
	filter: TemplateId,
	/// The group sampled by gradient and edge wear masks.
	value_group: Option<TemplateId>,
	decal: Option<TemplateId>,
}

impl MaskTemplates {
	fn resolve(context: &mut ModifyStackContext, kind: MaskKind, projection: ProjectionMode) -> Result<Self, StackError> {
		let (projection, triplanar_blend) = sub_graph::resolve_projection_templates(context, projection, false)?;
		let value_group = match kind {
			MaskKind::Gradient => Some(context.template(LINEAR_GRADIENT)?),
			MaskKind::EdgeWear => Some(context.template(EDGE_WEAR)?),
			_ => None,
		};
		Ok(Self {
			projection,
			triplanar_blend,
			filter: context.template(MASK_FILTER)?,
			value_group,
			decal: (kind == MaskKind::Decal).then(|| context.template(DECAL_PROJECTION)).transpose()?,
		})
	}
}

/// The projection a new mask of `kind` starts with. Decal masks sample through their own decal projection and keep a UV projection for the blur noise.
pub fn mask_projection(context: &ModifyStackContext, kind: MaskKind) -> ProjectionMode {
	match kind {
		MaskKind::Decal => ProjectionMode::UV,
		_ => context.preferences.new_entry_projection(),
	}
}

fn mask_value(context: &ModifyStackContext, kind: MaskKind, templates: &MaskTemplates, mesh_maps: &MeshMaps) -> ValueSource {
	match kind {
		MaskKind::Empty | MaskKind::Decal => ValueSource::Texture(None),
		MaskKind::Black => ValueSource::Constant(TaggedValue::F32(0.)),
		MaskKind::White => ValueSource::Constant(TaggedValue::F32(1.)),
		MaskKind::Grunge => ValueSource::Texture(context.preferences.grunge_image),
		MaskKind::MeshMapDriven(map) => ValueSource::Texture(mesh_maps.get(map)),
		MaskKind::Gradient | MaskKind::EdgeWear => match templates.value_group {
			Some(template) => ValueSource::Group(template),
			None => ValueSource::Texture(None),
		},
	}
}

/// Builds the sub-graph of a new mask with dirty names, ready to be inserted at index `mask` of layer `layer`.
pub fn build_mask(context: &mut ModifyStackContext, kind: MaskKind, layer: usize, mask: usize, mesh_maps: &MeshMaps) -> Result<Mask, StackError> {
	let projection_mode = mask_projection(context, kind);
	let templates = MaskTemplates::resolve(context, kind, projection_mode)?;
	let decal_anchor = (kind == MaskKind::Decal).then(|| context.scene.spawn_decal_anchor(&format!("Decal Mask {layer}.{mask}")));

	let mut staging = Staging::default();
	let build = MaskBuild {
		kind,
		projection_mode,
		decal_anchor,
		layer,
		mask,
	};
	match build.build(context, &mut staging, &templates, mesh_maps) {
		Ok(built) => {
			staging.commit();
			debug!("Built {kind} mask for index {mask} of layer {layer}");
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

struct MaskBuild {
	kind: MaskKind,
	projection_mode: ProjectionMode,
	decal_anchor: Option<ObjectId>,
	layer: usize,
	mask: usize,
}

impl MaskBuild {
	fn name(&self, node: MaskNode) -> String {
		dirty_name(&node.name(self.layer, self.mask))
	}

	fn build(self, context: &mut ModifyStackContext, staging: &mut Staging, templates: &MaskTemplates, mesh_maps: &MeshMaps) -> Result<Mask, StackError> {
		let row = context.mask_row(self.layer, self.mask);

		// The projection's label records the kind of the mask
		let position = context.position(column::PROJECTION, row);
		let projection = staging.instantiate(context, templates.projection, &self.name(MaskNode::Projection), &self.kind.to_string(), position)?;

		let decal = match (templates.decal, self.decal_anchor) {
			(Some(template), Some(anchor)) => {
				let position = context.position(column::PROJECTION, row) + context.preferences.node_spacing / 2;
				let decal = staging.instantiate(context, template, &self.name(MaskNode::Decal), MaskNode::Decal.label(), position)?;
				let object = context.input_socket(decal, OBJECT)?;
				context.set_input_value(object, TaggedValue::Object(Some(anchor)))?;
				Some(decal)
			}
			_ => None,
		};

		let mesh_map = match self.kind {
			MaskKind::EdgeWear => {
				let position = context.position(column::VALUE - 1, row) + context.preferences.node_spacing / 2;
				let kind = NodeKind::Texture {
					image: mesh_maps.get(MeshMapType::Curvature),
					interpolation: Interpolation::Linear,
				};
				Some(staging.create_node(context, kind, &self.name(MaskNode::MeshMap), MaskNode::MeshMap.label(), position)?)
			}
			_ => None,
		};

		let naming = SourceNaming {
			owner: SourceOwner::Mask { layer: self.layer, mask: self.mask },
			dirty: true,
			row,
		};
		let value = mask_value(context, self.kind, templates, mesh_maps);
		let mut source = sub_graph::create_source(context, staging, &naming, &value, templates.triplanar_blend)?;
		sub_graph::wire_source(context, &source, projection, decal.unwrap_or(projection), false)?;
		if let Some(mesh_map) = mesh_map {
			for &value in &source.values {
				let curvature = context.input_socket(value, CURVATURE)?;
				context.connect(OutputConnector::node(mesh_map, 0), curvature)?;
			}
		}

		let position = context.position(column::FILTER, row);
		let filter = staging.instantiate(context, templates.filter, &self.name(MaskNode::Filter), MaskNode::Filter.label(), position)?;
		let blur_noise = context.output_socket(projection, BLUR_NOISE)?;
		let blur_noise_input = context.input_socket(filter, BLUR_NOISE)?;
		context.connect(blur_noise, blur_noise_input)?;

		let position = context.position(column::MIX, row);
		let mix = staging.create_node(context, NodeKind::Mix { blend_mode: BlendMode::Multiply }, &self.name(MaskNode::Mix), MaskNode::Mix.label(), position)?;
		// Below the bottom mask the layer is fully opaque
		context.set_input_value(InputConnector::node(mix, 1), TaggedValue::F32(1.))?;
		context.connect(OutputConnector::node(filter, 0), InputConnector::node(mix, 2))?;

		let sink = context.input_socket(filter, VALUE)?;
		let route = Route {
			source: &mut source,
			naming,
			rotation_fix: None,
			projection,
			sink,
		};
		let output_channel = route_output_channel(context, route, OutputChannel::Color)?;

		Ok(Mask {
			kind: self.kind,
			projection_mode: self.projection_mode,
			output_channel,
			hidden: false,
			decal_anchor: self.decal_anchor,
			nodes: MaskNodes {
				projection,
				source,
				decal,
				mesh_map,
				filter,
				mix,
			},
		})
	}
}

/// Masks never use decal projection, and decal masks stay in UV.
pub fn check_mask_projection(kind: MaskKind, from: ProjectionMode, to: ProjectionMode) -> Result<(), StackError> {
	if to == ProjectionMode::Decal || (kind == MaskKind::Decal && to != ProjectionMode::UV) {
		return Err(StackError::InvalidProjectionTransition { from, to });
	}
	Ok(())
}
