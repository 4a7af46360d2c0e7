use super::node_graph::isolation::{self, Isolation};
use super::node_graph::mesh_map_binding::apply_mesh_maps;
use super::node_graph::modify_stack_context::ModifyStackContext;
use super::node_graph::refresh::refresh_stack;
use super::utility_types::channel_schema::ChannelSchema;
use super::utility_types::mesh_maps::MeshMaps;
use super::utility_types::stack::{LayerStack, MaterialRoot};
use crate::consts::MATERIAL_SHADER_NAME;
use crate::messages::prelude::*;

use material_graph::{AssetLibrary, GraphBackend, SceneObjects};

/// The backends and settings a material message is processed against.
pub struct MaterialMessageContext<'a> {
	pub network: &'a mut dyn GraphBackend,
	pub assets: &'a mut dyn AssetLibrary,
	pub scene: &'a mut dyn SceneObjects,
	pub schema: &'a ChannelSchema,
	pub preferences: &'a PreferencesMessageHandler,
}

#[derive(Debug, Default)]
pub struct MaterialMessageHandler {
	pub layer_stack: LayerStack,
	/// The contribution currently previewed in place of the shader.
	pub isolation: Option<Isolation>,
	/// The most recently baked mesh maps, seeded into new mesh map driven masks.
	pub mesh_maps: MeshMaps,
}

impl<'a> MessageHandler<MaterialMessage, MaterialMessageContext<'a>> for MaterialMessageHandler {
	fn process_message(&mut self, message: MaterialMessage, responses: &mut VecDeque<Message>, context: MaterialMessageContext<'a>) {
		let MaterialMessageContext {
			network,
			assets,
			scene,
			schema,
			preferences,
		} = context;
		let mut context = ModifyStackContext {
			network,
			assets,
			scene,
			schema,
			preferences,
		};

		let operation: &'static str = (&message).into();
		let (layer, mask) = message.target();

		// Responses of an operation are only released once the whole operation succeeded
		let mut operation_responses = VecDeque::new();
		match self.handle(&mut context, message, &mut operation_responses) {
			Ok(()) => responses.extend(operation_responses),
			Err(error) => {
				if error.requires_refresh() {
					log::error!("{operation} aborted, the stack must be refreshed before retrying: {error}");
				} else {
					warn!("{operation} failed: {error}");
				}
				responses.push_back(
					StackResponse::OperationFailed {
						operation: operation.to_string(),
						layer,
						mask,
						error,
					}
					.into(),
				);
			}
		}
	}
}

impl MaterialMessageHandler {
	fn root(&self) -> Result<MaterialRoot, StackError> {
		self.layer_stack.root.ok_or_else(|| StackError::MissingNode {
			name: MATERIAL_SHADER_NAME.to_string(),
		})
	}

	/// Reports a changed stack, re-applying the active isolation to the new structure.
	fn stack_changed(&mut self, context: &mut ModifyStackContext, responses: &mut VecDeque<Message>) -> Result<(), StackError> {
		responses.push_back(StackResponse::LayerStackChanged.into());
		let (Some(isolation), Some(root)) = (self.isolation.clone(), self.layer_stack.root) else {
			return Ok(());
		};
		match isolation::apply_isolation(context, &self.layer_stack, root, &isolation) {
			Err(StackError::IndexOutOfBounds { .. }) => {
				debug!("The isolated {isolation:?} is gone, showing the layer again");
				isolation::clear_isolation(context, root)?;
				self.isolation = None;
				responses.push_back(StackResponse::IsolationChanged { isolation: None }.into());
				Ok(())
			}
			result => result,
		}
	}

	fn isolate(&mut self, context: &mut ModifyStackContext, isolation: Isolation, responses: &mut VecDeque<Message>) -> Result<(), StackError> {
		let root = self.root()?;
		isolation::apply_isolation(context, &self.layer_stack, root, &isolation)?;
		self.isolation = Some(isolation.clone());
		responses.push_back(StackResponse::IsolationChanged { isolation: Some(isolation) }.into());
		Ok(())
	}

	fn refresh(&mut self, context: &mut ModifyStackContext, responses: &mut VecDeque<Message>) -> Result<(), StackError> {
		let mut layer_stack = refresh_stack(context.network, context.schema)?;
		layer_stack.selected = self.layer_stack.selected.filter(|selected| *selected < layer_stack.len());
		self.layer_stack = layer_stack;
		responses.push_back(StackResponse::LayerStackChanged.into());
		responses.push_back(StackResponse::LayerSelected { layer: self.layer_stack.selected }.into());
		Ok(())
	}

	fn handle(&mut self, context: &mut ModifyStackContext, message: MaterialMessage, responses: &mut VecDeque<Message>) -> Result<(), StackError> {
		match message {
			// Layers
			MaterialMessage::AddLayer { kind, insert_index } => {
				let layer = self.layer_stack.add_layer(context, kind, insert_index)?;
				self.stack_changed(context, responses)?;
				responses.push_back(StackResponse::LayerSelected { layer: Some(layer) }.into());
			}
			MaterialMessage::DuplicateLayer { layer } => {
				let layer = self.layer_stack.duplicate_layer(context, layer)?;
				self.stack_changed(context, responses)?;
				responses.push_back(StackResponse::LayerSelected { layer: Some(layer) }.into());
			}
			MaterialMessage::DeleteLayer { layer } => {
				self.layer_stack.delete_layer(context, layer)?;
				self.stack_changed(context, responses)?;
				responses.push_back(StackResponse::LayerSelected { layer: self.layer_stack.selected }.into());
			}
			MaterialMessage::MoveLayer { layer, direction } => {
				let moved = self.layer_stack.move_layer(context, layer, direction)?;
				if moved != layer {
					self.stack_changed(context, responses)?;
					responses.push_back(StackResponse::LayerSelected { layer: self.layer_stack.selected }.into());
				}
			}
			MaterialMessage::SetLayerProjection { layer, projection } => {
				self.layer_stack.set_layer_projection(context, layer, projection)?;
				self.stack_changed(context, responses)?;
			}
			MaterialMessage::SetBlendMode { layer, channel, blend_mode } => {
				self.layer_stack.set_blend_mode(context, layer, &channel, blend_mode)?;
				responses.push_back(StackResponse::LayerStackChanged.into());
			}
			MaterialMessage::SetOutputChannel { layer, channel, output_channel } => {
				let output_channel = self.layer_stack.set_output_channel(context, layer, &channel, output_channel)?;
				responses.push_back(
					StackResponse::OutputChannelChanged {
						layer,
						mask: None,
						channel: Some(channel),
						output_channel,
					}
					.into(),
				);
				self.stack_changed(context, responses)?;
			}
			MaterialMessage::ToggleLayerActive { layer } => {
				self.layer_stack.toggle_layer_active(context, layer)?;
				self.stack_changed(context, responses)?;
			}
			MaterialMessage::ToggleChannelFilter { layer, channel } => {
				self.layer_stack.toggle_channel_filter(context, layer, &channel)?;
				responses.push_back(StackResponse::LayerStackChanged.into());
			}
			MaterialMessage::SetImageAlphaBlend { layer, channel, enabled } => {
				self.layer_stack.set_image_alpha_blend(context, layer, &channel, enabled)?;
				responses.push_back(StackResponse::LayerStackChanged.into());
			}
			MaterialMessage::SetLayerOpacity { layer, opacity } => self.layer_stack.set_layer_opacity(context, layer, opacity)?,
			MaterialMessage::SelectLayer { layer } => {
				let layer = self.layer_stack.select_layer(layer)?;
				responses.push_back(StackResponse::LayerSelected { layer }.into());
			}

			// Masks
			MaterialMessage::AddMask { layer, kind, insert_index } => {
				let mask = self.layer_stack.add_mask(context, layer, kind, insert_index, &self.mesh_maps)?;
				self.stack_changed(context, responses)?;
				responses.push_back(StackResponse::MaskSelected { layer, mask: Some(mask) }.into());
			}
			MaterialMessage::DuplicateMask { layer, mask } => {
				let mask = self.layer_stack.duplicate_mask(context, layer, mask)?;
				self.stack_changed(context, responses)?;
				responses.push_back(StackResponse::MaskSelected { layer, mask: Some(mask) }.into());
			}
			MaterialMessage::DeleteMask { layer, mask } => {
				self.layer_stack.delete_mask(context, layer, mask)?;
				self.stack_changed(context, responses)?;
				let mask = self.layer_stack.get(layer)?.masks.selected;
				responses.push_back(StackResponse::MaskSelected { layer, mask }.into());
			}
			MaterialMessage::MoveMask { layer, mask, direction } => {
				let moved = self.layer_stack.move_mask(context, layer, mask, direction)?;
				if moved != mask {
					self.stack_changed(context, responses)?;
					let mask = self.layer_stack.get(layer)?.masks.selected;
					responses.push_back(StackResponse::MaskSelected { layer, mask }.into());
				}
			}
			MaterialMessage::SetMaskProjection { layer, mask, projection } => {
				self.layer_stack.set_mask_projection(context, layer, mask, projection)?;
				self.stack_changed(context, responses)?;
			}
			MaterialMessage::SetMaskOutputChannel { layer, mask, output_channel } => {
				let output_channel = self.layer_stack.set_mask_output_channel(context, layer, mask, output_channel)?;
				responses.push_back(
					StackResponse::OutputChannelChanged {
						layer,
						mask: Some(mask),
						channel: None,
						output_channel,
					}
					.into(),
				);
				self.stack_changed(context, responses)?;
			}
			MaterialMessage::ToggleMaskHidden { layer, mask } => {
				self.layer_stack.toggle_mask_hidden(context, layer, mask)?;
				self.stack_changed(context, responses)?;
			}
			MaterialMessage::SelectMask { layer, mask } => {
				let mask = self.layer_stack.select_mask(layer, mask)?;
				responses.push_back(StackResponse::MaskSelected { layer, mask }.into());
			}

			// Preview
			MaterialMessage::IsolateChannel { channel } => self.isolate(context, Isolation::Channel { channel }, responses)?,
			MaterialMessage::IsolateMask { layer, mask } => self.isolate(context, Isolation::Mask { layer, mask }, responses)?,
			MaterialMessage::IsolateMeshMap { map } => self.isolate(context, Isolation::MeshMap { map }, responses)?,
			MaterialMessage::ShowLayer => {
				if let Some(root) = self.layer_stack.root {
					isolation::clear_isolation(context, root)?;
				}
				if self.isolation.take().is_some() {
					responses.push_back(StackResponse::IsolationChanged { isolation: None }.into());
				}
			}

			MaterialMessage::ApplyMeshMaps { maps } => {
				self.mesh_maps.merge(&maps);
				let nodes = apply_mesh_maps(context, &self.layer_stack, &self.mesh_maps)?;
				responses.push_back(StackResponse::MeshMapsApplied { nodes }.into());
			}
			MaterialMessage::Refresh => self.refresh(context, responses)?,
			MaterialMessage::MaterialChanged => {
				self.layer_stack = LayerStack::default();
				self.isolation = None;
				self.refresh(context, responses)?;
			}
		}
		Ok(())
	}
}
