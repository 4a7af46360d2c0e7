use crate::error::StackError;

use glam::Vec4;
use material_graph::{BlendMode, TaggedValue};
use serde::{Deserialize, Serialize};

/// The kind of data a material channel carries. A `Vector` channel holds tangent space normals.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumIter)]
pub enum DataType {
	Scalar,
	Color,
	Vector,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelValue {
	Scalar(f32),
	Color([f32; 4]),
}

impl ChannelValue {
	pub fn tagged_value(&self) -> TaggedValue {
		match *self {
			ChannelValue::Scalar(value) => TaggedValue::F32(value),
			ChannelValue::Color(color) => TaggedValue::Color(Vec4::from_array(color)),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelDefinition {
	pub name: String,
	pub data_type: DataType,
	pub default_value: ChannelValue,
	#[serde(default)]
	pub default_blend_mode: BlendMode,
}

impl ChannelDefinition {
	pub fn new(name: &str, data_type: DataType, default_value: ChannelValue) -> Self {
		Self {
			name: name.to_string(),
			data_type,
			default_value,
			default_blend_mode: BlendMode::Mix,
		}
	}

	pub fn with_blend_mode(mut self, blend_mode: BlendMode) -> Self {
		self.default_blend_mode = blend_mode;
		self
	}

	pub fn is_normal(&self) -> bool {
		self.data_type == DataType::Vector
	}
}

/// The ordered list of channels every layer contributes to. Read-only once a material is bound to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelSchema {
	channels: Vec<ChannelDefinition>,
}

impl Default for ChannelSchema {
	fn default() -> Self {
		let flat_normal = [0.5, 0.5, 1., 1.];
		Self::new(vec![
			ChannelDefinition::new("Color", DataType::Color, ChannelValue::Color([0.8, 0.8, 0.8, 1.])),
			ChannelDefinition::new("Subsurface", DataType::Scalar, ChannelValue::Scalar(0.)),
			ChannelDefinition::new("Metallic", DataType::Scalar, ChannelValue::Scalar(0.)),
			ChannelDefinition::new("Specular", DataType::Scalar, ChannelValue::Scalar(0.5)),
			ChannelDefinition::new("Roughness", DataType::Scalar, ChannelValue::Scalar(0.5)),
			ChannelDefinition::new("Emission", DataType::Color, ChannelValue::Color([0., 0., 0., 1.])).with_blend_mode(BlendMode::Add),
			ChannelDefinition::new("Normal", DataType::Vector, ChannelValue::Color(flat_normal)),
			ChannelDefinition::new("Height", DataType::Scalar, ChannelValue::Scalar(0.)).with_blend_mode(BlendMode::Add),
			ChannelDefinition::new("Alpha", DataType::Scalar, ChannelValue::Scalar(1.)),
		])
	}
}

impl ChannelSchema {
	pub fn new(channels: Vec<ChannelDefinition>) -> Self {
		Self { channels }
	}

	/// Reads a schema from a JSON array of channel definitions.
	pub fn from_json(json: &str) -> Result<Self, StackError> {
		let schema: Self = serde_json::from_str(json).map_err(|error| StackError::InvalidSchema(error.to_string()))?;
		for (index, channel) in schema.channels.iter().enumerate() {
			if schema.channels[..index].iter().any(|other| other.name == channel.name) {
				return Err(StackError::InvalidSchema(format!("Channel \"{}\" is defined twice", channel.name)));
			}
		}
		Ok(schema)
	}

	pub fn channels(&self) -> &[ChannelDefinition] {
		&self.channels
	}

	pub fn len(&self) -> usize {
		self.channels.len()
	}

	pub fn is_empty(&self) -> bool {
		self.channels.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&ChannelDefinition> {
		self.channels.get(index)
	}

	pub fn index_of(&self, name: &str) -> Result<usize, StackError> {
		self.channels.iter().position(|channel| channel.name == name).ok_or_else(|| StackError::UnknownChannel(name.to_string()))
	}

	/// The channel image layers paint into: the first channel holding colors.
	pub fn base_color(&self) -> Option<usize> {
		self.channels.iter().position(|channel| channel.data_type == DataType::Color)
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn default_schema() {
		let schema = ChannelSchema::default();
		assert_eq!(schema.len(), 9);
		assert_eq!(schema.base_color(), Some(0));
		assert!(schema.get(schema.index_of("Normal").unwrap()).unwrap().is_normal());
		assert_eq!(schema.index_of("Sheen"), Err(StackError::UnknownChannel("Sheen".to_string())));
	}

	#[test]
	fn schema_from_json() {
		let json = r#"[
			{ "name": "Roughness", "data_type": "Scalar", "default_value": 0.25 },
			{ "name": "Color", "data_type": "Color", "default_value": [1.0, 0.0, 0.0, 1.0], "default_blend_mode": "Multiply" }
		]"#;
		let schema = ChannelSchema::from_json(json).unwrap();
		assert_eq!(schema.get(0).unwrap().default_value.tagged_value(), TaggedValue::F32(0.25));
		assert_eq!(schema.get(1).unwrap().default_blend_mode, BlendMode::Multiply);
		assert_eq!(schema.base_color(), Some(1));
	}

	#[test]
	fn schema_rejects_duplicates() {
		let json = r#"[
			{ "name": "Roughness", "data_type": "Scalar", "default_value": 0.25 },
			{ "name": "Roughness", "data_type": "Scalar", "default_value": 0.5 }
		]"#;
		assert!(matches!(ChannelSchema::from_json(json), Err(StackError::InvalidSchema(_))));
	}
}
