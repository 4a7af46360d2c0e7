use crate::messages::material::utility_types::mesh_maps::MeshMaps;
use crate::messages::material::utility_types::stack::{LayerKind, MaskKind, MeshMapType, MoveDirection, OutputChannel, ProjectionMode};

use material_graph::BlendMode;
use serde::{Deserialize, Serialize};

/// Edits to the layer stack of the active material. Layer and mask indices count from the bottom of their stack.
#[derive(PartialEq, Clone, Debug, Serialize, Deserialize, strum::IntoStaticStr)]
pub enum MaterialMessage {
	// Layers
	AddLayer {
		kind: LayerKind,
		/// On top of the stack when `None`.
		insert_index: Option<usize>,
	},
	DuplicateLayer {
		layer: usize,
	},
	DeleteLayer {
		layer: usize,
	},
	MoveLayer {
		layer: usize,
		direction: MoveDirection,
	},
	SetLayerProjection {
		layer: usize,
		projection: ProjectionMode,
	},
	SetBlendMode {
		layer: usize,
		channel: String,
		blend_mode: BlendMode,
	},
	SetOutputChannel {
		layer: usize,
		channel: String,
		output_channel: OutputChannel,
	},
	ToggleLayerActive {
		layer: usize,
	},
	ToggleChannelFilter {
		layer: usize,
		channel: String,
	},
	SetImageAlphaBlend {
		layer: usize,
		channel: String,
		enabled: bool,
	},
	SetLayerOpacity {
		layer: usize,
		opacity: f32,
	},
	SelectLayer {
		layer: Option<usize>,
	},

	// Masks
	AddMask {
		layer: usize,
		kind: MaskKind,
		insert_index: Option<usize>,
	},
	DuplicateMask {
		layer: usize,
		mask: usize,
	},
	DeleteMask {
		layer: usize,
		mask: usize,
	},
	MoveMask {
		layer: usize,
		mask: usize,
		direction: MoveDirection,
	},
	SetMaskProjection {
		layer: usize,
		mask: usize,
		projection: ProjectionMode,
	},
	SetMaskOutputChannel {
		layer: usize,
		mask: usize,
		output_channel: OutputChannel,
	},
	ToggleMaskHidden {
		layer: usize,
		mask: usize,
	},
	SelectMask {
		layer: usize,
		mask: Option<usize>,
	},

	// Preview
	IsolateChannel {
		channel: String,
	},
	IsolateMask {
		layer: usize,
		mask: usize,
	},
	IsolateMeshMap {
		map: MeshMapType,
	},
	ShowLayer,

	ApplyMeshMaps {
		maps: MeshMaps,
	},
	/// Rebuilds the stack from the names of the material's nodes.
	Refresh,
	/// The active material was swapped for another one.
	MaterialChanged,
}

impl MaterialMessage {
	/// The layer and mask a message operates on, as reported when it fails.
	pub fn target(&self) -> (Option<usize>, Option<usize>) {
		match *self {
			MaterialMessage::AddLayer { insert_index, .. } => (insert_index, None),
			MaterialMessage::DuplicateLayer { layer }
			| MaterialMessage::DeleteLayer { layer }
			| MaterialMessage::MoveLayer { layer, .. }
			| MaterialMessage::SetLayerProjection { layer, .. }
			| MaterialMessage::SetBlendMode { layer, .. }
			| MaterialMessage::SetOutputChannel { layer, .. }
			| MaterialMessage::ToggleLayerActive { layer }
			| MaterialMessage::ToggleChannelFilter { layer, .. }
			| MaterialMessage::SetImageAlphaBlend { layer, .. }
			| MaterialMessage::SetLayerOpacity { layer, .. } => (Some(layer), None),
			MaterialMessage::SelectLayer { layer } => (layer, None),
			MaterialMessage::AddMask { layer, insert_index, .. } => (Some(layer), insert_index),
			MaterialMessage::DuplicateMask { layer, mask }
			| MaterialMessage::DeleteMask { layer, mask }
			| MaterialMessage::MoveMask { layer, mask, .. }
			| MaterialMessage::SetMaskProjection { layer, mask, .. }
			| MaterialMessage::SetMaskOutputChannel { layer, mask, .. }
			| MaterialMessage::ToggleMaskHidden { layer, mask }
			| MaterialMessage::IsolateMask { layer, mask } => (Some(layer), Some(mask)),
			MaterialMessage::SelectMask { layer, mask } => (Some(layer), mask),
			_ => (None, None),
		}
	}
}
