//! The operations on the mask stack of one layer. Mask names embed the index of their layer, so every plan is made for one layer at a time.

use super::channel_router::{Route, route_output_channel};
use super::layer_operations::{discard_mask, duplicate_anchor};
use super::link::link_masks;
use super::mask_builder::build_mask;
use super::modify_stack_context::ModifyStackContext;
use super::node_definitions::VALUE;
use super::projection;
use super::reindex::{plan_insert, plan_move, plan_remove};
use super::sub_graph::{SourceNaming, SourceOwner};
use super::validation::validate_stack;
use crate::error::{StackError, check_index};
use crate::messages::material::utility_types::mesh_maps::MeshMaps;
use crate::messages::material::utility_types::naming::dirty_name;
use crate::messages::material::utility_types::stack::{LayerStack, Mask, MaskKind, MoveDirection, OutputChannel, ProjectionMode};

use material_graph::NodeId;

fn prepare_mask_copy(context: &mut ModifyStackContext, mask: &mut Mask, layer: usize, at: usize) -> Result<(), StackError> {
	let anchor = mask.decal_anchor.take();
	for (node_id, name) in mask.named_nodes(layer, at) {
		context.network.rename(node_id, &dirty_name(&name))?;
	}
	mask.decal_anchor = duplicate_anchor(context, anchor, mask.nodes.decal)?;
	Ok(())
}

impl LayerStack {
	/// Builds a mask of `kind` and inserts it into the mask stack of `layer`, on top by default. Returns the index of the new mask.
	pub fn add_mask(&mut self, context: &mut ModifyStackContext, layer: usize, kind: MaskKind, insert_index: Option<usize>, mesh_maps: &MeshMaps) -> Result<usize, StackError> {
		validate_stack(context.network, self)?;
		let layer_entry = self.get_mut(layer)?;
		let masks = &mut layer_entry.masks;
		let at = insert_index.unwrap_or(masks.len());
		check_index(at, masks.len() + 1)?;

		let mask = build_mask(context, kind, layer, at, mesh_maps)?;
		let plan = plan_insert(&masks.masks, &mask, at, |mask, index| mask.named_nodes(layer, index));
		if let Err(error) = plan.validate(context.network) {
			discard_mask(context, &mask);
			return Err(error);
		}
		plan.commit(context.network)?;

		masks.masks.insert(at, mask);
		masks.selected = Some(at);
		link_masks(context, layer_entry)?;
		info!("Added {kind} mask at index {at} of layer {layer}");
		Ok(at)
	}

	/// Copies a mask into an independent mask right above it. Returns the index of the copy.
	pub fn duplicate_mask(&mut self, context: &mut ModifyStackContext, layer: usize, index: usize) -> Result<usize, StackError> {
		validate_stack(context.network, self)?;
		let layer_entry = self.get_mut(layer)?;
		let masks = &mut layer_entry.masks;
		let source = masks.get(index)?;
		let at = index + 1;

		let copies = context.network.duplicate_nodes(&source.node_ids())?;
		let mut mask = source.clone();
		mask.map_nodes(&|node_id: NodeId| copies.get(&node_id).copied().unwrap_or(node_id));
		let plan = prepare_mask_copy(context, &mut mask, layer, at).map(|_| plan_insert(&masks.masks, &mask, at, |mask, index| mask.named_nodes(layer, index)));
		let plan = match plan.and_then(|plan| plan.validate(context.network).map(|_| plan)) {
			Ok(plan) => plan,
			Err(error) => {
				discard_mask(context, &mask);
				return Err(error);
			}
		};
		plan.commit(context.network)?;

		masks.masks.insert(at, mask);
		masks.selected = Some(at);
		link_masks(context, layer_entry)?;
		info!("Duplicated mask {index} of layer {layer} into index {at}");
		Ok(at)
	}

	pub fn delete_mask(&mut self, context: &mut ModifyStackContext, layer: usize, index: usize) -> Result<(), StackError> {
		validate_stack(context.network, self)?;
		let layer_entry = self.get_mut(layer)?;
		let masks = &mut layer_entry.masks;
		check_index(index, masks.len())?;
		let plan = plan_remove(&masks.masks, index, |mask, at| mask.named_nodes(layer, at));
		plan.validate(context.network)?;

		let mask = masks.masks.remove(index);
		discard_mask(context, &mask);
		plan.commit(context.network)?;

		masks.selected = match masks.selected {
			_ if masks.masks.is_empty() => None,
			Some(selected) if selected > index => Some(selected - 1),
			Some(selected) if selected == index => Some(index.min(masks.len() - 1)),
			selected => selected,
		};
		link_masks(context, layer_entry)?;
		info!("Deleted mask {index} of layer {layer}");
		Ok(())
	}

	/// Swaps a mask with its neighbor in `direction`. Moving past either end of the mask stack does nothing. Returns the new index of the mask.
	pub fn move_mask(&mut self, context: &mut ModifyStackContext, layer: usize, index: usize, direction: MoveDirection) -> Result<usize, StackError> {
		validate_stack(context.network, self)?;
		let layer_entry = self.get_mut(layer)?;
		let masks = &mut layer_entry.masks;
		check_index(index, masks.len())?;
		let to = match direction {
			MoveDirection::Up => Some(index + 1).filter(|to| *to < masks.len()),
			MoveDirection::Down => index.checked_sub(1),
		};
		let Some(to) = to else {
			warn!("Mask {index} of layer {layer} is already at the edge of the mask stack");
			return Ok(index);
		};

		let plan = plan_move(&masks.masks, index, to, |mask, at| mask.named_nodes(layer, at));
		plan.validate(context.network)?;
		plan.commit(context.network)?;
		masks.masks.swap(index, to);
		if masks.selected == Some(index) {
			masks.selected = Some(to);
		} else if masks.selected == Some(to) {
			masks.selected = Some(index);
		}
		link_masks(context, layer_entry)?;
		debug!("Moved mask {index} of layer {layer} to {to}");
		Ok(to)
	}

	pub fn set_mask_projection(&mut self, context: &mut ModifyStackContext, layer: usize, index: usize, projection: ProjectionMode) -> Result<(), StackError> {
		validate_stack(context.network, self)?;
		let layer_entry = self.get_mut(layer)?;
		projection::set_mask_projection(context, layer_entry.masks.get_mut(index)?, layer, index, projection)?;
		link_masks(context, layer_entry)
	}

	/// Routes `output_channel` of a mask's source into its filter, returning the output channel in use after any fallback.
	pub fn set_mask_output_channel(&mut self, context: &mut ModifyStackContext, layer: usize, index: usize, output_channel: OutputChannel) -> Result<OutputChannel, StackError> {
		validate_stack(context.network, self)?;
		let row = context.mask_row(layer, index);
		let layer_entry = self.get_mut(layer)?;
		let mask = layer_entry.masks.get_mut(index)?;

		let sink = context.input_socket(mask.nodes.filter, VALUE)?;
		let route = Route {
			source: &mut mask.nodes.source,
			naming: SourceNaming {
				owner: SourceOwner::Mask { layer, mask: index },
				dirty: false,
				row,
			},
			rotation_fix: None,
			projection: mask.nodes.projection,
			sink,
		};
		mask.output_channel = route_output_channel(context, route, output_channel)?;
		let output_channel = mask.output_channel;
		link_masks(context, layer_entry)?;
		Ok(output_channel)
	}

	/// Hides or shows a mask, returning whether it is now hidden.
	pub fn toggle_mask_hidden(&mut self, context: &mut ModifyStackContext, layer: usize, index: usize) -> Result<bool, StackError> {
		validate_stack(context.network, self)?;
		let layer_entry = self.get_mut(layer)?;
		let mask = layer_entry.masks.get_mut(index)?;
		context.network.set_muted(mask.nodes.mix, !mask.hidden)?;
		mask.hidden = !mask.hidden;
		let hidden = mask.hidden;
		link_masks(context, layer_entry)?;
		Ok(hidden)
	}

	pub fn select_mask(&mut self, layer: usize, index: Option<usize>) -> Result<Option<usize>, StackError> {
		let masks = &mut self.get_mut(layer)?.masks;
		if let Some(index) = index {
			check_index(index, masks.len())?;
		}
		masks.selected = index;
		Ok(index)
	}
}

#[cfg(test)]
mod test {
	use crate::messages::material::utility_types::stack::{LayerKind, MaskKind, MeshMapType, MoveDirection, OutputChannel, ProjectionMode};
	use crate::messages::prelude::*;
	use crate::test_utils::{StackTestUtils, failure};
	use material_graph::{GraphBackend, ImageId, NodeKind, SceneObjects};
	use pretty_assertions::assert_eq;

	fn layer_with_masks(kinds: &[MaskKind]) -> StackTestUtils {
		let mut utils = StackTestUtils::create();
		utils.handle_ok(MaterialMessage::AddLayer {
			kind: LayerKind::Material,
			insert_index: None,
		});
		for &kind in kinds {
			utils.handle_ok(MaterialMessage::AddMask { layer: 0, kind, insert_index: None });
		}
		utils
	}

	#[test]
	fn masks_chain_into_the_layer_opacity() {
		let mut utils = layer_with_masks(&[MaskKind::Gradient, MaskKind::White]);
		utils.assert_contiguous();
		assert!(utils.feeds("MASK_PROJECTION_0_0", 0, "MASK_VALUE_0_0", 0));
		assert!(utils.feeds("MASK_PROJECTION_0_0", 2, "MASK_FILTER_0_0", 1));
		assert!(utils.feeds("MASK_FILTER_0_0", 0, "MASK_MIX_0_0", 2));
		assert!(utils.feeds("MASK_MIX_0_0", 0, "MASK_MIX_0_1", 1));
		assert!(utils.feeds("MASK_MIX_0_1", 0, "OPACITY_0", 1));
		assert_eq!(utils.stack().layers[0].masks.selected, Some(1));

		utils.handle_ok(MaterialMessage::ToggleMaskHidden { layer: 0, mask: 1 });
		assert!(utils.stack().layers[0].masks.masks[1].hidden);
		assert!(utils.feeds("MASK_MIX_0_0", 0, "OPACITY_0", 1));
		utils.handle_ok(MaterialMessage::ToggleMaskHidden { layer: 0, mask: 0 });
		assert_eq!(utils.upstream("OPACITY_0", 1), None);
	}

	#[test]
	fn mask_names_follow_their_layer() {
		let mut utils = layer_with_masks(&[MaskKind::Black]);
		let mix = utils.node_named("MASK_MIX_0_0");

		utils.handle_ok(MaterialMessage::AddLayer {
			kind: LayerKind::Material,
			insert_index: Some(0),
		});
		assert_eq!(utils.name_of(mix), "MASK_MIX_1_0");
		assert!(utils.feeds("MASK_MIX_1_0", 0, "OPACITY_1", 1));
		assert!(utils.stack().layers[0].masks.is_empty());
		utils.assert_contiguous();
	}

	#[test]
	fn deleting_and_moving_masks() {
		let mut utils = layer_with_masks(&[MaskKind::Black, MaskKind::White, MaskKind::Grunge]);
		let top = utils.node_named("MASK_MIX_0_2");
		let bottom = utils.node_named("MASK_MIX_0_0");

		let responses = utils.handle_ok(MaterialMessage::DeleteMask { layer: 0, mask: 1 });
		assert_eq!(responses.last(), Some(&StackResponse::MaskSelected { layer: 0, mask: Some(1) }));
		assert_eq!(utils.name_of(top), "MASK_MIX_0_1");
		assert!(!utils.has_node("MASK_MIX_0_2"));
		assert!(utils.feeds("MASK_MIX_0_0", 0, "MASK_MIX_0_1", 1));
		utils.assert_contiguous();

		utils.handle_ok(MaterialMessage::MoveMask {
			layer: 0,
			mask: 0,
			direction: MoveDirection::Up,
		});
		assert_eq!(utils.name_of(bottom), "MASK_MIX_0_1");
		assert_eq!(utils.name_of(top), "MASK_MIX_0_0");
		assert_eq!(utils.stack().layers[0].masks.masks[1].kind, MaskKind::Black);
		assert!(utils.feeds("MASK_MIX_0_1", 0, "OPACITY_0", 1));
		utils.assert_contiguous();

		let responses = utils.handle_ok(MaterialMessage::MoveMask {
			layer: 0,
			mask: 0,
			direction: MoveDirection::Down,
		});
		assert_eq!(responses, Vec::new());
	}

	#[test]
	fn mask_projection_round_trip() {
		let mut utils = layer_with_masks(&[MaskKind::Grunge]);
		let uv = utils.named_edges();

		utils.handle_ok(MaterialMessage::SetMaskProjection {
			layer: 0,
			mask: 0,
			projection: ProjectionMode::Triplanar,
		});
		assert!(utils.has_node("MASK_TRIPLANAR_BLEND_0_0"));
		assert!(utils.feeds("MASK_PROJECTION_0_0", 2, "MASK_VALUE_0_0_3", 0));
		assert!(utils.feeds("MASK_PROJECTION_0_0", 6, "MASK_FILTER_0_0", 1));
		assert!(utils.feeds("MASK_TRIPLANAR_BLEND_0_0", 0, "MASK_FILTER_0_0", 0));
		utils.assert_contiguous();

		utils.handle_ok(MaterialMessage::SetMaskProjection {
			layer: 0,
			mask: 0,
			projection: ProjectionMode::UV,
		});
		assert_eq!(utils.named_edges(), uv);

		let responses = utils.handle_message(MaterialMessage::SetMaskProjection {
			layer: 0,
			mask: 0,
			projection: ProjectionMode::Decal,
		});
		assert!(matches!(failure(&responses), Some(StackError::InvalidProjectionTransition { .. })));
	}

	#[test]
	fn mask_output_channels() {
		let mut utils = layer_with_masks(&[MaskKind::Grunge, MaskKind::Black]);

		utils.handle_ok(MaterialMessage::SetMaskOutputChannel {
			layer: 0,
			mask: 0,
			output_channel: OutputChannel::Red,
		});
		assert!(utils.feeds("MASK_VALUE_0_0", 0, "MASK_SEPARATE_0_0", 0));
		assert!(utils.feeds("MASK_SEPARATE_0_0", 0, "MASK_FILTER_0_0", 0));

		utils.handle_ok(MaterialMessage::SetMaskOutputChannel {
			layer: 0,
			mask: 0,
			output_channel: OutputChannel::Alpha,
		});
		assert!(!utils.has_node("MASK_SEPARATE_0_0"));
		assert!(utils.feeds("MASK_VALUE_0_0", 1, "MASK_FILTER_0_0", 0));

		let responses = utils.handle_ok(MaterialMessage::SetMaskOutputChannel {
			layer: 0,
			mask: 1,
			output_channel: OutputChannel::Alpha,
		});
		assert_eq!(
			responses[0],
			StackResponse::OutputChannelChanged {
				layer: 0,
				mask: Some(1),
				channel: None,
				output_channel: OutputChannel::Color,
			}
		);
	}

	#[test]
	fn decal_masks() {
		let mut utils = layer_with_masks(&[MaskKind::Decal]);
		let anchor = utils.stack().layers[0].masks.masks[0].decal_anchor.unwrap();
		assert!(utils.feeds("MASK_DECAL_0_0", 0, "MASK_VALUE_0_0", 0));
		// The blur noise still comes from the mask's own projection
		assert!(utils.feeds("MASK_PROJECTION_0_0", 2, "MASK_FILTER_0_0", 1));

		let responses = utils.handle_message(MaterialMessage::SetMaskProjection {
			layer: 0,
			mask: 0,
			projection: ProjectionMode::Triplanar,
		});
		assert_eq!(
			failure(&responses),
			Some(&StackError::InvalidProjectionTransition {
				from: ProjectionMode::UV,
				to: ProjectionMode::Triplanar,
			})
		);

		utils.handle_ok(MaterialMessage::DuplicateMask { layer: 0, mask: 0 });
		let copy = utils.stack().layers[0].masks.masks[1].decal_anchor.unwrap();
		assert_ne!(anchor, copy);
		utils.assert_contiguous();

		utils.handle_ok(MaterialMessage::DeleteMask { layer: 0, mask: 0 });
		assert!(!utils.scene.contains(anchor));
		assert!(utils.scene.contains(copy));
		assert_eq!(utils.stack().layers[0].masks.masks[0].decal_anchor, Some(copy));
	}

	#[test]
	fn edge_wear_reads_the_curvature_map() {
		let mut utils = layer_with_masks(&[MaskKind::EdgeWear]);
		assert!(utils.feeds("MASK_MESH_MAP_0_0", 0, "MASK_VALUE_0_0", 1));

		utils.handle_ok(MaterialMessage::SetMaskProjection {
			layer: 0,
			mask: 0,
			projection: ProjectionMode::Triplanar,
		});
		for sample in ["MASK_VALUE_0_0_1", "MASK_VALUE_0_0_2", "MASK_VALUE_0_0_3"] {
			assert!(utils.feeds("MASK_MESH_MAP_0_0", 0, sample, 1));
		}
		let mesh_map = utils.network.node(utils.node_named("MASK_MESH_MAP_0_0")).unwrap();
		assert!(matches!(mesh_map.kind, NodeKind::Texture { image: None, .. }));
	}

	#[test]
	fn mesh_map_masks_start_from_the_latest_bake() {
		let mut utils = layer_with_masks(&[]);
		let maps = [(MeshMapType::AmbientOcclusion, ImageId(7))].into_iter().collect();
		utils.handle_ok(MaterialMessage::ApplyMeshMaps { maps });

		utils.handle_ok(MaterialMessage::AddMask {
			layer: 0,
			kind: MaskKind::MeshMapDriven(MeshMapType::AmbientOcclusion),
			insert_index: None,
		});
		let value = utils.network.node(utils.node_named("MASK_VALUE_0_0")).unwrap();
		assert!(matches!(value.kind, NodeKind::Texture { image: Some(ImageId(7)), .. }));
		assert_eq!(utils.network.node(utils.node_named("MASK_PROJECTION_0_0")).unwrap().label, "Mesh Map: Ambient Occlusion");
	}

	#[test]
	fn selecting_masks() {
		let mut utils = layer_with_masks(&[MaskKind::White]);
		let responses = utils.handle_ok(MaterialMessage::SelectMask { layer: 0, mask: None });
		assert_eq!(responses, vec![StackResponse::MaskSelected { layer: 0, mask: None }]);

		let responses = utils.handle_message(MaterialMessage::SelectMask { layer: 0, mask: Some(4) });
		assert_eq!(failure(&responses), Some(&StackError::IndexOutOfBounds { index: 4, len: 1 }));
		let responses = utils.handle_message(MaterialMessage::AddMask {
			layer: 3,
			kind: MaskKind::White,
			insert_index: None,
		});
		assert_eq!(failure(&responses), Some(&StackError::IndexOutOfBounds { index: 3, len: 1 }));
	}
}
