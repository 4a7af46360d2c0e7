use super::stack::MeshMapType;

use material_graph::ImageId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The latest baked image of each mesh map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshMaps {
	maps: BTreeMap<MeshMapType, ImageId>,
}

impl MeshMaps {
	pub fn get(&self, map: MeshMapType) -> Option<ImageId> {
		self.maps.get(&map).copied()
	}

	pub fn insert(&mut self, map: MeshMapType, image: ImageId) -> Option<ImageId> {
		self.maps.insert(map, image)
	}

	/// Takes every map `other` provides, keeping the maps it lacks.
	pub fn merge(&mut self, other: &MeshMaps) {
		self.maps.extend(other.maps.iter().map(|(map, image)| (*map, *image)));
	}

	pub fn is_empty(&self) -> bool {
		self.maps.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (MeshMapType, ImageId)> + '_ {
		self.maps.iter().map(|(map, image)| (*map, *image))
	}
}

impl FromIterator<(MeshMapType, ImageId)> for MeshMaps {
	fn from_iter<T: IntoIterator<Item = (MeshMapType, ImageId)>>(iter: T) -> Self {
		Self { maps: iter.into_iter().collect() }
	}
}
