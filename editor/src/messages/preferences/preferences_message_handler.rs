use crate::consts::{DEFAULT_NODE_SPACING, DEFAULT_TRIPLANAR_BLENDING};
use crate::messages::material::utility_types::stack::ProjectionMode;
use crate::messages::prelude::*;

use glam::IVec2;
use material_graph::ImageId;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesMessageHandler {
	/// The projection new layers and masks start with. Decal is reserved for decal layers.
	pub default_projection: ProjectionMode,
	/// Sharpness of the seams between triplanar samples, written into every triplanar blend node.
	pub triplanar_blending: f32,
	/// Distance between builder nodes in the graph view.
	pub node_spacing: IVec2,
	pub placeholder_image: Option<ImageId>,
	pub grunge_image: Option<ImageId>,
}

impl Default for PreferencesMessageHandler {
	fn default() -> Self {
		Self {
			default_projection: ProjectionMode::UV,
			triplanar_blending: DEFAULT_TRIPLANAR_BLENDING,
			node_spacing: DEFAULT_NODE_SPACING,
			placeholder_image: None,
			grunge_image: None,
		}
	}
}

impl PreferencesMessageHandler {
	/// The projection newly built entries use.
	pub fn new_entry_projection(&self) -> ProjectionMode {
		match self.default_projection {
			ProjectionMode::Decal => ProjectionMode::UV,
			projection => projection,
		}
	}
}

impl MessageHandler<PreferencesMessage, ()> for PreferencesMessageHandler {
	fn process_message(&mut self, message: PreferencesMessage, responses: &mut VecDeque<Message>, _context: ()) {
		match message {
			PreferencesMessage::Load { preferences } => match serde_json::from_str::<PreferencesMessageHandler>(&preferences) {
				Ok(deserialized_preferences) => *self = deserialized_preferences,
				Err(error) => {
					warn!("Ignoring malformed preferences: {error}");
					responses.push_back(
						StackResponse::OperationFailed {
							operation: "Load Preferences".to_string(),
							layer: None,
							mask: None,
							error: StackError::InvalidPreferences(error.to_string()),
						}
						.into(),
					);
					return;
				}
			},
			PreferencesMessage::ResetToDefaults => *self = Self::default(),

			PreferencesMessage::DefaultProjection { projection } => {
				if projection == ProjectionMode::Decal {
					warn!("Decal projection is reserved for decal layers, new entries will use UV");
				}
				self.default_projection = projection;
			}
			PreferencesMessage::TriplanarBlending { sharpness } => self.triplanar_blending = sharpness.clamp(0., 1.),
			PreferencesMessage::NodeSpacing { spacing } => self.node_spacing = spacing.max(IVec2::ONE),
			PreferencesMessage::PlaceholderImage { image } => self.placeholder_image = image,
			PreferencesMessage::GrungeImage { image } => self.grunge_image = image,
		}

		responses.push_back(StackResponse::PreferencesChanged.into());
	}
}
