use glam::Vec4;
use std::fmt;

/// Handle to an image owned by the host environment (a texture file, a baked map, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageId(pub u64);

/// Handle to a scene object, such as the empty that anchors a decal projection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(pub u64);

impl fmt::Display for ImageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "image:{}", self.0)
	}
}

impl fmt::Display for ObjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "object:{}", self.0)
	}
}

/// A type that is known, allowing serialization of node input values.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TaggedValue {
	#[default]
	None,
	Bool(bool),
	F32(f32),
	/// RGBA color, or an XYZ vector with `w` unused.
	Color(Vec4),
	Object(Option<ObjectId>),
}

impl TaggedValue {
	pub fn as_f32(&self) -> Option<f32> {
		if let TaggedValue::F32(value) = self { Some(*value) } else { None }
	}

	pub fn as_color(&self) -> Option<Vec4> {
		if let TaggedValue::Color(color) = self { Some(*color) } else { None }
	}

	pub fn as_object(&self) -> Option<ObjectId> {
		if let TaggedValue::Object(object) = self { *object } else { None }
	}
}

/// Describes how the contribution of an upper entry is composited onto what lies below it.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default, Hash, strum::Display, strum::EnumIter, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BlendMode {
	/// The top value replaces the bottom value, weighted by the mix factor.
	#[default]
	Mix,
	/// The final value is composed of the darkest values of each component.
	Darken,
	/// The final value is the result of multiplying the top and bottom values.
	/// A black layer leads to a black result, and a white layer leads to no change.
	Multiply,
	/// The final value is the result of inverting the bottom value, dividing it by the top value, and inverting that value.
	ColorBurn,
	/// The final value is composed of the lightest values of each component.
	Lighten,
	/// The final value is the result of inverting the values, multiplying them, and inverting that value.
	/// A black layer leads to no change, and a white layer leads to a white result.
	Screen,
	/// The final value is the result of dividing the bottom value by the inverse of the top value.
	ColorDodge,
	/// The top value is added to the bottom value.
	Add,
	/// The final value is the result of [Multiply](BlendMode::Multiply) if the bottom value is darker, or [Screen](BlendMode::Screen) if it is lighter.
	Overlay,
	/// Similar to [Overlay](BlendMode::Overlay), but softer.
	SoftLight,
	/// Dodges or burns the bottom value depending on whether the top value is lighter or darker than half.
	LinearLight,
	/// The final value is the result of subtracting the darker of the two values from the lighter one.
	Difference,
	/// Similar to [Difference](BlendMode::Difference), but with less contrast.
	Exclusion,
	/// The top value is subtracted from the bottom value.
	Subtract,
	/// The bottom value is divided by the top value.
	Divide,
	/// The final color has the *hue* of the top color, while using the *saturation* and *value* of the bottom color.
	Hue,
	/// The final color has the *saturation* of the top color, while using the *hue* and *value* of the bottom color.
	Saturation,
	/// The final color has the *hue* and *saturation* of the top color, while using the *value* of the bottom color.
	Color,
	/// The final color has the *value* of the top color, while using the *hue* and *saturation* of the bottom color.
	Value,
}

#[derive(PartialEq, Eq, Copy, Clone, Debug, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MathOperation {
	Add,
	Subtract,
	#[default]
	Multiply,
	Divide,
}

/// Texture lookup filtering for image-sampling nodes.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interpolation {
	#[default]
	Linear,
	Closest,
	Cubic,
	Smart,
}
