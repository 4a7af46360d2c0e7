use crate::messages::material::utility_types::stack::ProjectionMode;

use glam::IVec2;
use material_graph::ImageId;
use serde::{Deserialize, Serialize};

#[derive(PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum PreferencesMessage {
	/// Replaces every preference with the JSON serialized `preferences`.
	Load { preferences: String },
	ResetToDefaults,

	DefaultProjection { projection: ProjectionMode },
	TriplanarBlending { sharpness: f32 },
	NodeSpacing { spacing: IVec2 },
	PlaceholderImage { image: Option<ImageId> },
	GrungeImage { image: Option<ImageId> },
}
