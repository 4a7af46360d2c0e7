use crate::document::value::ObjectId;

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SceneError {
	#[error("Object {0} does not exist in the scene")]
	ObjectNotFound(ObjectId),
}

/// The scene owning the external objects layers may reference (decal anchors). Layers only hold weak [`ObjectId`] references.
pub trait SceneObjects {
	fn spawn_decal_anchor(&mut self, name: &str) -> ObjectId;
	fn duplicate_object(&mut self, object: ObjectId) -> Result<ObjectId, SceneError>;
	fn remove_object(&mut self, object: ObjectId) -> Result<(), SceneError>;
	fn contains(&self, object: ObjectId) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SceneObject {
	pub name: String,
}

/// An in-memory scene, enough to track the lifetime of decal anchors.
#[derive(Clone, Debug, Default)]
pub struct Scene {
	objects: BTreeMap<ObjectId, SceneObject>,
	next_id: u64,
}

impl Scene {
	pub fn object(&self, object: ObjectId) -> Option<&SceneObject> {
		self.objects.get(&object)
	}

	pub fn len(&self) -> usize {
		self.objects.len()
	}

	pub fn is_empty(&self) -> bool {
		self.objects.is_empty()
	}

	fn insert(&mut self, object: SceneObject) -> ObjectId {
		self.next_id += 1;
		let id = ObjectId(self.next_id);
		self.objects.insert(id, object);
		id
	}
}

impl SceneObjects for Scene {
	fn spawn_decal_anchor(&mut self, name: &str) -> ObjectId {
		self.insert(SceneObject { name: name.to_string() })
	}

	fn duplicate_object(&mut self, object: ObjectId) -> Result<ObjectId, SceneError> {
		let copy = self.objects.get(&object).cloned().ok_or(SceneError::ObjectNotFound(object))?;
		Ok(self.insert(SceneObject { name: format!("{}.copy", copy.name) }))
	}

	fn remove_object(&mut self, object: ObjectId) -> Result<(), SceneError> {
		self.objects.remove(&object).map(|_| ()).ok_or(SceneError::ObjectNotFound(object))
	}

	fn contains(&self, object: ObjectId) -> bool {
		self.objects.contains_key(&object)
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn anchor_lifetime() {
		let mut scene = Scene::default();
		let anchor = scene.spawn_decal_anchor("Decal");
		let copy = scene.duplicate_object(anchor).unwrap();
		assert_ne!(anchor, copy);
		assert_eq!(scene.object(copy).unwrap().name, "Decal.copy");

		scene.remove_object(anchor).unwrap();
		assert!(!scene.contains(anchor));
		assert_eq!(scene.remove_object(anchor), Err(SceneError::ObjectNotFound(anchor)));
		assert_eq!(scene.len(), 1);
	}
}
