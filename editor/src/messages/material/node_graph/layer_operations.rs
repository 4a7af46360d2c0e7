//! The structural and per-channel operations on a material's layer stack.
//!
//! Each operation validates the stack against the network first, and computes every rename before applying the first one, so a failing
//! operation leaves both the stack and the graph as they were.

use super::channel_router::{Route, route_image_alpha, route_output_channel};
use super::layer_builder::build_layer;
use super::link::link_layers;
use super::modify_stack_context::ModifyStackContext;
use super::node_definitions::{OBJECT, VALUE};
use super::projection;
use super::reindex::{plan_insert, plan_move, plan_remove};
use super::sub_graph::{SourceNaming, SourceOwner, column};
use super::validation::validate_stack;
use crate::consts::{MATERIAL_OUTPUT_NAME, MATERIAL_SHADER_NAME};
use crate::error::{StackError, check_index};
use crate::messages::material::utility_types::naming::dirty_name;
use crate::messages::material::utility_types::stack::{Layer, LayerKind, LayerStack, Mask, MaterialRoot, MoveDirection, OutputChannel, ProjectionMode};

use material_graph::{BlendMode, InputConnector, NodeId, NodeKind, ObjectId, OutputConnector, TaggedValue};

/// Finds the shader and material output of the material, creating and connecting them when the material has none yet.
pub fn ensure_root(context: &mut ModifyStackContext, stack: &LayerStack) -> Result<MaterialRoot, StackError> {
	if let Some(root) = stack.root {
		return Ok(root);
	}

	let schema = context.schema;
	let shader = match context.network.find_by_name(MATERIAL_SHADER_NAME) {
		Some(shader) => shader,
		None => {
			let position = context.position(column::MIX + 1, 0);
			let shader = context.network.create_node(NodeKind::Shader { channels: schema.len() })?;
			context.network.rename(shader, MATERIAL_SHADER_NAME)?;
			context.network.set_label(shader, "Shader")?;
			context.network.set_position(shader, position)?;
			for (channel_index, channel) in schema.channels().iter().enumerate() {
				context.set_input_value(InputConnector::node(shader, channel_index), channel.default_value.tagged_value())?;
			}
			shader
		}
	};
	let output = match context.network.find_by_name(MATERIAL_OUTPUT_NAME) {
		Some(output) => output,
		None => {
			let position = context.position(column::MIX + 2, 0);
			let output = context.network.create_node(NodeKind::MaterialOutput)?;
			context.network.rename(output, MATERIAL_OUTPUT_NAME)?;
			context.network.set_label(output, "Material Output")?;
			context.network.set_position(output, position)?;
			output
		}
	};
	context.connect(OutputConnector::node(shader, 0), InputConnector::node(output, 0))?;
	debug!("Created the material root");
	Ok(MaterialRoot { shader, output })
}

fn release_anchor(context: &mut ModifyStackContext, anchor: Option<ObjectId>) {
	let Some(anchor) = anchor else { return };
	if let Err(error) = context.scene.remove_object(anchor) {
		warn!("Could not release decal anchor {anchor}: {error}");
	}
}

fn remove_nodes(context: &mut ModifyStackContext, nodes: impl IntoIterator<Item = NodeId>) {
	for node_id in nodes {
		if let Err(error) = context.network.remove_node(node_id) {
			warn!("Could not remove node {node_id}: {error}");
		}
	}
}

/// Removes the sub-graph of a layer that is not part of the stack, together with the decal anchors it owns.
pub(super) fn discard_layer(context: &mut ModifyStackContext, layer: &Layer) {
	release_anchor(context, layer.decal_anchor);
	for mask in &layer.masks.masks {
		release_anchor(context, mask.decal_anchor);
	}
	remove_nodes(context, layer.node_ids());
}

/// Removes the sub-graph of a mask that is not part of a mask stack, together with its decal anchor.
pub(super) fn discard_mask(context: &mut ModifyStackContext, mask: &Mask) {
	release_anchor(context, mask.decal_anchor);
	remove_nodes(context, mask.node_ids());
}

/// Gives a copied entry its own decal anchor, pointing the decal projection at it.
pub(super) fn duplicate_anchor(context: &mut ModifyStackContext, anchor: Option<ObjectId>, projection: Option<NodeId>) -> Result<Option<ObjectId>, StackError> {
	let Some(source) = anchor else { return Ok(None) };
	let copy = context.scene.duplicate_object(source)?;
	if let Some(projection) = projection {
		let object = context.input_socket(projection, OBJECT)?;
		context.set_input_value(object, TaggedValue::Object(Some(copy)))?;
	}
	Ok(Some(copy))
}

/// Gives the copies made by duplicating a layer dirty names and their own decal anchors.
///
/// The copies start out without anchors, so discarding a half prepared copy never releases an anchor of the original.
fn prepare_layer_copy(context: &mut ModifyStackContext, layer: &mut Layer, at: usize) -> Result<(), StackError> {
	let layer_anchor = layer.decal_anchor.take();
	let mask_anchors = layer.masks.masks.iter_mut().map(|mask| mask.decal_anchor.take()).collect::<Vec<_>>();

	for (node_id, name) in layer.named_nodes(at) {
		context.network.rename(node_id, &dirty_name(&name))?;
	}
	layer.decal_anchor = duplicate_anchor(context, layer_anchor, Some(layer.projection))?;
	for (mask, anchor) in layer.masks.masks.iter_mut().zip(mask_anchors) {
		mask.decal_anchor = duplicate_anchor(context, anchor, mask.nodes.decal)?;
	}
	Ok(())
}

impl LayerStack {
	/// Builds a layer of `kind` and inserts it at `insert_index`, on top of the stack by default. Returns the index of the new layer.
	pub fn add_layer(&mut self, context: &mut ModifyStackContext, kind: LayerKind, insert_index: Option<usize>) -> Result<usize, StackError> {
		validate_stack(context.network, self)?;
		let at = insert_index.unwrap_or(self.len());
		check_index(at, self.len() + 1)?;

		let layer = build_layer(context, kind, at)?;
		let plan = plan_insert(&self.layers, &layer, at, Layer::named_nodes);
		let root = plan.validate(context.network).and_then(|_| ensure_root(context, self));
		let root = match root {
			Ok(root) => root,
			Err(error) => {
				discard_layer(context, &layer);
				return Err(error);
			}
		};
		plan.commit(context.network)?;

		self.root = Some(root);
		self.layers.insert(at, layer);
		link_layers(context, self)?;
		self.selected = Some(at);
		info!("Added {kind} layer at index {at}");
		Ok(at)
	}

	/// Copies the layer at `index`, masks included, into an independent layer right above it. Returns the index of the copy.
	pub fn duplicate_layer(&mut self, context: &mut ModifyStackContext, index: usize) -> Result<usize, StackError> {
		validate_stack(context.network, self)?;
		let source = self.get(index)?;
		let at = index + 1;

		let copies = context.network.duplicate_nodes(&source.node_ids())?;
		let mut layer = source.remapped(&copies);
		let plan = prepare_layer_copy(context, &mut layer, at).map(|_| plan_insert(&self.layers, &layer, at, Layer::named_nodes));
		let plan = match plan.and_then(|plan| plan.validate(context.network).map(|_| plan)) {
			Ok(plan) => plan,
			Err(error) => {
				discard_layer(context, &layer);
				return Err(error);
			}
		};
		plan.commit(context.network)?;

		self.layers.insert(at, layer);
		link_layers(context, self)?;
		self.selected = Some(at);
		info!("Duplicated layer {index} into index {at}");
		Ok(at)
	}

	/// Deletes the layer at `index` with its masks and releases the decal anchors it owns.
	pub fn delete_layer(&mut self, context: &mut ModifyStackContext, index: usize) -> Result<(), StackError> {
		validate_stack(context.network, self)?;
		check_index(index, self.len())?;
		let plan = plan_remove(&self.layers, index, Layer::named_nodes);
		plan.validate(context.network)?;

		let layer = self.layers.remove(index);
		discard_layer(context, &layer);
		plan.commit(context.network)?;
		link_layers(context, self)?;

		self.selected = match self.selected {
			_ if self.layers.is_empty() => None,
			Some(selected) if selected > index => Some(selected - 1),
			Some(selected) if selected == index => Some(index.min(self.len() - 1)),
			selected => selected,
		};
		info!("Deleted layer {index}");
		Ok(())
	}

	/// Swaps the layer at `index` with its neighbor in `direction`. Moving past either end of the stack does nothing. Returns the new index of the layer.
	pub fn move_layer(&mut self, context: &mut ModifyStackContext, index: usize, direction: MoveDirection) -> Result<usize, StackError> {
		validate_stack(context.network, self)?;
		check_index(index, self.len())?;
		let to = match direction {
			MoveDirection::Up => Some(index + 1).filter(|to| *to < self.len()),
			MoveDirection::Down => index.checked_sub(1),
		};
		let Some(to) = to else {
			warn!("Layer {index} is already at the edge of the stack");
			return Ok(index);
		};

		let plan = plan_move(&self.layers, index, to, Layer::named_nodes);
		plan.validate(context.network)?;
		plan.commit(context.network)?;
		self.layers.swap(index, to);
		link_layers(context, self)?;

		if self.selected == Some(index) {
			self.selected = Some(to);
		} else if self.selected == Some(to) {
			self.selected = Some(index);
		}
		debug!("Moved layer {index} to {to}");
		Ok(to)
	}

	pub fn set_layer_projection(&mut self, context: &mut ModifyStackContext, index: usize, projection: ProjectionMode) -> Result<(), StackError> {
		validate_stack(context.network, self)?;
		projection::set_layer_projection(context, self.get_mut(index)?, index, projection)?;
		link_layers(context, self)
	}

	pub fn set_blend_mode(&mut self, context: &mut ModifyStackContext, index: usize, channel: &str, blend_mode: BlendMode) -> Result<(), StackError> {
		validate_stack(context.network, self)?;
		let channel = self.get_mut(index)?.channels.iter_mut().find(|candidate| candidate.name == channel).ok_or_else(|| StackError::UnknownChannel(channel.to_string()))?;
		context.network.set_node_kind(channel.nodes.mix, NodeKind::Mix { blend_mode })?;
		channel.blend_mode = blend_mode;
		Ok(())
	}

	/// Routes `output_channel` of a channel's source into its filter, returning the output channel in use after any fallback.
	pub fn set_output_channel(&mut self, context: &mut ModifyStackContext, index: usize, channel: &str, output_channel: OutputChannel) -> Result<OutputChannel, StackError> {
		validate_stack(context.network, self)?;
		let row = context.layer_row(index);
		let layer = self.get_mut(index)?;
		let channel_index = layer.channel_index(channel)?;
		let projection = layer.projection;
		let channel = &mut layer.channels[channel_index];

		let sink = context.input_socket(channel.nodes.filter, VALUE)?;
		let name = channel.name.clone();
		let route = Route {
			source: &mut channel.nodes.source,
			naming: SourceNaming {
				owner: SourceOwner::Channel { layer: index, channel: &name },
				dirty: false,
				row: row + channel_index as i32,
			},
			rotation_fix: channel.nodes.rotation_fix,
			projection,
			sink,
		};
		channel.output_channel = route_output_channel(context, route, output_channel)?;
		let output_channel = channel.output_channel;
		link_layers(context, self)?;
		Ok(output_channel)
	}

	/// Mutes or unmutes the layer at `index`, returning whether it is now active.
	pub fn toggle_layer_active(&mut self, context: &mut ModifyStackContext, index: usize) -> Result<bool, StackError> {
		validate_stack(context.network, self)?;
		let layer = self.get_mut(index)?;
		context.network.set_muted(layer.opacity, layer.active)?;
		layer.active = !layer.active;
		let active = layer.active;
		link_layers(context, self)?;
		Ok(active)
	}

	/// Bypasses or restores the filter of a channel, returning whether it is now active.
	pub fn toggle_channel_filter(&mut self, context: &mut ModifyStackContext, index: usize, channel: &str) -> Result<bool, StackError> {
		validate_stack(context.network, self)?;
		let layer = self.get_mut(index)?;
		let channel_index = layer.channel_index(channel)?;
		let channel = &mut layer.channels[channel_index];
		context.network.set_muted(channel.nodes.filter, channel.filter_active)?;
		channel.filter_active = !channel.filter_active;
		Ok(channel.filter_active)
	}

	/// Lets the alpha of a channel's image scale its contribution. Returns whether it is in effect, which it never is for non-image sources.
	pub fn set_image_alpha_blend(&mut self, context: &mut ModifyStackContext, index: usize, channel: &str, enabled: bool) -> Result<bool, StackError> {
		validate_stack(context.network, self)?;
		let layer = self.get_mut(index)?;
		let channel_index = layer.channel_index(channel)?;
		let channel = &mut layer.channels[channel_index];
		channel.image_alpha_blend_enabled = enabled;
		route_image_alpha(context, channel)
	}

	pub fn set_layer_opacity(&mut self, context: &mut ModifyStackContext, index: usize, opacity: f32) -> Result<(), StackError> {
		validate_stack(context.network, self)?;
		let layer = self.get(index)?;
		context.set_input_value(InputConnector::node(layer.opacity, 0), TaggedValue::F32(opacity.clamp(0., 1.)))
	}

	pub fn select_layer(&mut self, index: Option<usize>) -> Result<Option<usize>, StackError> {
		if let Some(index) = index {
			check_index(index, self.len())?;
		}
		self.selected = index;
		Ok(index)
	}
}

#[cfg(test)]
mod test {
	use crate::messages::material::node_graph::node_definitions::{COLOR_FILTER, SIGNED_GEOMETRY_NORMAL, TRIPLANAR_NORMAL_BLEND, TRIPLANAR_PROJECTION, default_asset_library, resolve_template_definition};
	use crate::messages::material::utility_types::stack::{LayerKind, OutputChannel, ProjectionMode};
	use crate::messages::prelude::*;
	use crate::test_utils::{StackTestUtils, failure};
	use material_graph::{BlendMode, GraphBackend, InputConnector, NodeKind, SceneObjects, TaggedValue};
	use pretty_assertions::assert_eq;

	fn add_layer(utils: &mut StackTestUtils, kind: LayerKind) {
		utils.handle_ok(MaterialMessage::AddLayer { kind, insert_index: None });
	}

	fn set_projection(utils: &mut StackTestUtils, layer: usize, projection: ProjectionMode) -> Vec<StackResponse> {
		utils.handle_message(MaterialMessage::SetLayerProjection { layer, projection })
	}

	#[test]
	fn first_layer_creates_the_material_root() {
		let mut utils = StackTestUtils::create();
		add_layer(&mut utils, LayerKind::Material);

		let root = utils.stack().root.unwrap();
		assert_eq!(utils.name_of(root.shader), "MATERIAL_SHADER");
		assert!(utils.feeds("MATERIAL_SHADER", 0, "MATERIAL_OUTPUT", 0));
		assert!(utils.feeds("COLOR_MIX_0", 0, "MATERIAL_SHADER", 0));
		// Below the bottom layer each channel starts from its default value
		let mix = utils.network.node(utils.node_named("SPECULAR_MIX_0")).unwrap();
		assert_eq!(mix.inputs[1].as_value(), Some(&TaggedValue::F32(0.5)));
		utils.assert_contiguous();

		add_layer(&mut utils, LayerKind::Material);
		assert_eq!(utils.stack().root, Some(root));
		assert_eq!(utils.network.nodes_named("MATERIAL_SHADER").len(), 1);
	}

	#[test]
	fn inserting_below_shifts_the_stack_up() {
		let mut utils = StackTestUtils::create();
		add_layer(&mut utils, LayerKind::Material);
		let bottom = utils.node_named("OPACITY_0");

		utils.handle_ok(MaterialMessage::AddLayer {
			kind: LayerKind::Image,
			insert_index: Some(0),
		});
		assert_eq!(utils.name_of(bottom), "OPACITY_1");
		assert_eq!(utils.stack().layers[0].kind, LayerKind::Image);
		assert_eq!(utils.stack().selected, Some(0));
		utils.assert_contiguous();
		assert!(utils.feeds("COLOR_MIX_0", 0, "COLOR_MIX_1", 1));
	}

	#[test]
	fn projection_round_trip_restores_the_graph() {
		let mut utils = StackTestUtils::create();
		add_layer(&mut utils, LayerKind::Image);
		let uv = utils.named_edges();

		assert_eq!(failure(&set_projection(&mut utils, 0, ProjectionMode::Triplanar)), None);
		assert!(!utils.has_node("COLOR_VALUE_0"));
		assert!(!utils.has_node("NORMAL_ROTATION_FIX_0"));
		for (sample, axis) in ["COLOR_VALUE_0_1", "COLOR_VALUE_0_2", "COLOR_VALUE_0_3"].into_iter().enumerate() {
			assert!(utils.feeds("PROJECTION_0", sample, axis, 0));
			assert!(utils.feeds(axis, 0, "COLOR_TRIPLANAR_BLEND_0", sample));
			assert!(utils.feeds(axis, 1, "COLOR_TRIPLANAR_BLEND_0", 3 + sample));
		}
		assert!(utils.feeds("COLOR_TRIPLANAR_BLEND_0", 0, "COLOR_FILTER_0", 0));
		assert!(utils.feeds("NORMAL_TRIPLANAR_BLEND_0", 0, "NORMAL_FILTER_0", 0));
		assert_eq!(utils.stack().layers[0].projection_mode, ProjectionMode::Triplanar);
		utils.assert_contiguous();

		assert_eq!(failure(&set_projection(&mut utils, 0, ProjectionMode::UV)), None);
		assert_eq!(utils.named_edges(), uv);
		utils.assert_contiguous();
	}

	#[test]
	fn projection_switch_keeps_output_channels() {
		let mut utils = StackTestUtils::create();
		add_layer(&mut utils, LayerKind::Image);
		utils.handle_ok(MaterialMessage::SetOutputChannel {
			layer: 0,
			channel: "Color".to_string(),
			output_channel: OutputChannel::Alpha,
		});
		assert!(utils.feeds("COLOR_VALUE_0", 1, "COLOR_FILTER_0", 0));

		set_projection(&mut utils, 0, ProjectionMode::Triplanar);
		assert_eq!(utils.stack().layers[0].channel("Color").unwrap().output_channel, OutputChannel::Alpha);
		assert!(utils.feeds("COLOR_TRIPLANAR_BLEND_0", 1, "COLOR_FILTER_0", 0));
	}

	#[test]
	fn decal_layers_keep_their_projection() {
		let mut utils = StackTestUtils::create();
		add_layer(&mut utils, LayerKind::Decal);
		let edges = utils.named_edges();

		let responses = set_projection(&mut utils, 0, ProjectionMode::Triplanar);
		assert_eq!(
			failure(&responses),
			Some(&StackError::InvalidProjectionTransition {
				from: ProjectionMode::Decal,
				to: ProjectionMode::Triplanar,
			})
		);
		assert_eq!(utils.named_edges(), edges);

		add_layer(&mut utils, LayerKind::Material);
		let responses = set_projection(&mut utils, 1, ProjectionMode::Decal);
		assert!(matches!(failure(&responses), Some(StackError::InvalidProjectionTransition { .. })));
	}

	#[test]
	fn missing_templates_leave_the_graph_untouched() {
		let mut assets = default_asset_library();
		assets.remove(TRIPLANAR_PROJECTION);
		let mut utils = StackTestUtils::with_assets(assets);
		add_layer(&mut utils, LayerKind::Material);
		let edges = utils.named_edges();

		let responses = set_projection(&mut utils, 0, ProjectionMode::Triplanar);
		assert_eq!(failure(&responses), Some(&StackError::MissingTemplate(TRIPLANAR_PROJECTION.to_string())));
		assert_eq!(utils.named_edges(), edges);
		assert_eq!(utils.stack().layers[0].projection_mode, ProjectionMode::UV);
	}

	#[test]
	fn incomplete_templates_are_rejected_before_any_channel_switches() {
		let mut blend = resolve_template_definition(TRIPLANAR_NORMAL_BLEND).unwrap().clone();
		blend.inputs.retain(|(socket, _)| socket != SIGNED_GEOMETRY_NORMAL);
		let mut assets = default_asset_library();
		assets.insert(blend);
		let mut utils = StackTestUtils::with_assets(assets);
		add_layer(&mut utils, LayerKind::Image);
		let edges = utils.named_edges();

		let responses = set_projection(&mut utils, 0, ProjectionMode::Triplanar);
		assert_eq!(
			failure(&responses),
			Some(&StackError::MissingTemplate(format!("{TRIPLANAR_NORMAL_BLEND} (input \"{SIGNED_GEOMETRY_NORMAL}\")")))
		);
		// Channels ahead of the normal channel are left in UV too
		assert_eq!(utils.named_edges(), edges);
		assert!(utils.has_node("COLOR_VALUE_0"));
		assert!(!utils.has_node("COLOR_TRIPLANAR_BLEND_0"));
		assert_eq!(utils.stack().layers[0].projection_mode, ProjectionMode::UV);
		utils.assert_contiguous();
	}

	#[test]
	fn missing_templates_create_no_layer() {
		let mut assets = default_asset_library();
		assets.remove(COLOR_FILTER);
		let mut utils = StackTestUtils::with_assets(assets);

		let responses = utils.handle_message(MaterialMessage::AddLayer {
			kind: LayerKind::Decal,
			insert_index: None,
		});
		assert_eq!(failure(&responses), Some(&StackError::MissingTemplate(COLOR_FILTER.to_string())));
		assert!(utils.network.nodes.is_empty());
		assert!(utils.scene.is_empty());
		assert!(utils.stack().is_empty());
		assert_eq!(utils.stack().root, None);
	}

	#[test]
	fn decal_anchors_belong_to_one_layer() {
		let mut utils = StackTestUtils::create();
		add_layer(&mut utils, LayerKind::Decal);
		let anchor = utils.stack().layers[0].decal_anchor.unwrap();
		assert!(utils.feeds("OPACITY_0", 0, "DECAL_MASK_0", 0));
		assert!(utils.feeds("DECAL_MASK_0", 0, "COLOR_OPACITY_0", 0));

		utils.handle_ok(MaterialMessage::DuplicateLayer { layer: 0 });
		let copy = utils.stack().layers[1].decal_anchor.unwrap();
		assert_ne!(anchor, copy);
		assert_eq!(utils.scene.len(), 2);
		let projection = utils.network.node(utils.node_named("PROJECTION_1")).unwrap();
		assert!(projection.inputs.iter().any(|input| input.as_value() == Some(&TaggedValue::Object(Some(copy)))));
		utils.assert_contiguous();

		utils.handle_ok(MaterialMessage::DeleteLayer { layer: 1 });
		assert!(utils.scene.contains(anchor));
		assert!(!utils.scene.contains(copy));
	}

	#[test]
	fn duplicated_layers_are_independent() {
		let mut utils = StackTestUtils::create();
		add_layer(&mut utils, LayerKind::Material);
		utils.handle_ok(MaterialMessage::AddMask {
			layer: 0,
			kind: crate::messages::material::utility_types::stack::MaskKind::White,
			insert_index: None,
		});

		let responses = utils.handle_ok(MaterialMessage::DuplicateLayer { layer: 0 });
		assert_eq!(responses.last(), Some(&StackResponse::LayerSelected { layer: Some(1) }));
		let (original, copy) = (utils.stack().layers[0].node_ids(), utils.stack().layers[1].node_ids());
		assert_eq!(original.len(), copy.len());
		assert!(original.iter().all(|node_id| !copy.contains(node_id)));
		utils.assert_contiguous();
		assert!(utils.feeds("MASK_MIX_1_0", 0, "OPACITY_1", 1));
		assert!(utils.feeds("COLOR_MIX_0", 0, "COLOR_MIX_1", 1));
		assert!(utils.feeds("COLOR_MIX_1", 0, "MATERIAL_SHADER", 0));

		utils.handle_ok(MaterialMessage::SetLayerOpacity { layer: 1, opacity: 0.25 });
		let opacity = |utils: &StackTestUtils, name: &str| utils.network.node(utils.node_named(name)).unwrap().inputs[0].clone();
		assert_eq!(opacity(&utils, "OPACITY_1").as_value(), Some(&TaggedValue::F32(0.25)));
		assert_eq!(opacity(&utils, "OPACITY_0").as_value(), Some(&TaggedValue::F32(1.)));
	}

	#[test]
	fn channel_settings() {
		let mut utils = StackTestUtils::create();
		add_layer(&mut utils, LayerKind::Image);
		let mix = utils.node_named("COLOR_MIX_0");

		utils.handle_ok(MaterialMessage::SetBlendMode {
			layer: 0,
			channel: "Color".to_string(),
			blend_mode: BlendMode::Multiply,
		});
		assert_eq!(utils.network.node(mix).unwrap().kind, NodeKind::Mix { blend_mode: BlendMode::Multiply });
		// Changing the blend mode keeps the mix linked
		assert!(utils.feeds("COLOR_MIX_0", 0, "MATERIAL_SHADER", 0));
		assert!(utils.feeds("COLOR_FILTER_0", 0, "COLOR_MIX_0", 2));

		utils.handle_ok(MaterialMessage::ToggleChannelFilter {
			layer: 0,
			channel: "Color".to_string(),
		});
		assert!(utils.network.node(utils.node_named("COLOR_FILTER_0")).unwrap().muted);
		assert!(!utils.stack().layers[0].channels[0].filter_active);

		utils.handle_ok(MaterialMessage::SetLayerOpacity { layer: 0, opacity: 3. });
		let opacity = utils.network.node(utils.node_named("OPACITY_0")).unwrap();
		assert_eq!(opacity.inputs[0].as_value(), Some(&TaggedValue::F32(1.)));
	}

	#[test]
	fn image_alpha_blending() {
		let mut utils = StackTestUtils::create();
		add_layer(&mut utils, LayerKind::Image);
		let opacity = InputConnector::node(utils.node_named("COLOR_OPACITY_0"), 1);

		let enable = |channel: &str| MaterialMessage::SetImageAlphaBlend {
			layer: 0,
			channel: channel.to_string(),
			enabled: true,
		};
		utils.handle_ok(enable("Color"));
		assert!(utils.feeds("COLOR_VALUE_0", 1, "COLOR_OPACITY_0", 1));
		assert!(utils.stack().layers[0].channels[0].image_alpha_blend_enabled);

		// Constant sources have no alpha to blend with
		utils.handle_ok(enable("Roughness"));
		assert!(!utils.stack().layers[0].channel("Roughness").unwrap().image_alpha_blend_enabled);
		assert_eq!(utils.upstream("ROUGHNESS_OPACITY_0", 1), None);

		utils.handle_ok(MaterialMessage::SetImageAlphaBlend {
			layer: 0,
			channel: "Color".to_string(),
			enabled: false,
		});
		assert_eq!(utils.network.upstream_output(opacity), None);
	}

	#[test]
	fn deleting_the_last_layer_clears_the_selection() {
		let mut utils = StackTestUtils::create();
		add_layer(&mut utils, LayerKind::Material);
		let responses = utils.handle_ok(MaterialMessage::DeleteLayer { layer: 0 });
		assert_eq!(responses.last(), Some(&StackResponse::LayerSelected { layer: None }));
		assert!(!utils.has_node("PROJECTION_0"));
		assert_eq!(utils.upstream("MATERIAL_SHADER", 0), None);
	}
}
