//! Positional node names. A node's name encodes the stack position of the entry owning it, which is how a material's
//! stacks are persisted inside the graph and recovered by a refresh.

use crate::consts::DIRTY_MARKER;

/// Upper-case name fragment used for a channel, e.g. `"Base Color"` becomes `"BASE_COLOR"`.
pub fn channel_key(channel: &str) -> String {
	channel.trim().to_uppercase().replace(|c: char| c.is_whitespace() || c == '-', "_")
}

/// The role a node plays inside the sub-graph of one layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerNode<'a> {
	Projection,
	Opacity,
	DecalMask,
	/// `sample` is `None` for the single value node, or `0..3` for the triplanar samples.
	Value { channel: &'a str, sample: Option<usize> },
	TriplanarBlend(&'a str),
	Separate(&'a str),
	RotationFix(&'a str),
	Filter(&'a str),
	ChannelOpacity(&'a str),
	Mix(&'a str),
}

impl LayerNode<'_> {
	pub fn name(&self, layer: usize) -> String {
		match *self {
			LayerNode::Projection => format!("PROJECTION_{layer}"),
			LayerNode::Opacity => format!("OPACITY_{layer}"),
			LayerNode::DecalMask => format!("DECAL_MASK_{layer}"),
			LayerNode::Value { channel, sample: None } => format!("{}_VALUE_{layer}", channel_key(channel)),
			LayerNode::Value { channel, sample: Some(sample) } => format!("{}_VALUE_{layer}_{}", channel_key(channel), sample + 1),
			LayerNode::TriplanarBlend(channel) => format!("{}_TRIPLANAR_BLEND_{layer}", channel_key(channel)),
			LayerNode::Separate(channel) => format!("{}_SEPARATE_{layer}", channel_key(channel)),
			LayerNode::RotationFix(channel) => format!("{}_ROTATION_FIX_{layer}", channel_key(channel)),
			LayerNode::Filter(channel) => format!("{}_FILTER_{layer}", channel_key(channel)),
			LayerNode::ChannelOpacity(channel) => format!("{}_OPACITY_{layer}", channel_key(channel)),
			LayerNode::Mix(channel) => format!("{}_MIX_{layer}", channel_key(channel)),
		}
	}

	pub fn label(&self) -> String {
		match *self {
			LayerNode::Projection => "Projection".to_string(),
			LayerNode::Opacity => "Layer Opacity".to_string(),
			LayerNode::DecalMask => "Decal Mask".to_string(),
			LayerNode::Value { channel, sample: None } => format!("{channel} Value"),
			LayerNode::Value { channel, sample: Some(sample) } => format!("{channel} Value {}", ["X", "Y", "Z"].get(sample).unwrap_or(&"?")),
			LayerNode::TriplanarBlend(channel) => format!("{channel} Triplanar Blend"),
			LayerNode::Separate(channel) => format!("{channel} Separate"),
			LayerNode::RotationFix(channel) => format!("{channel} Rotation Fix"),
			LayerNode::Filter(channel) => format!("{channel} Filter"),
			LayerNode::ChannelOpacity(channel) => format!("{channel} Opacity"),
			LayerNode::Mix(channel) => format!("{channel} Mix"),
		}
	}
}

/// The role a node plays inside the sub-graph of one mask. Mask names embed both the layer and the mask index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaskNode {
	Projection,
	Value { sample: Option<usize> },
	TriplanarBlend,
	Separate,
	Decal,
	MeshMap,
	Filter,
	Mix,
}

impl MaskNode {
	pub fn name(&self, layer: usize, mask: usize) -> String {
		let role = match *self {
			MaskNode::Projection => "PROJECTION",
			MaskNode::Value { sample: None } => "VALUE",
			MaskNode::Value { sample: Some(sample) } => return format!("MASK_VALUE_{layer}_{mask}_{}", sample + 1),
			MaskNode::TriplanarBlend => "TRIPLANAR_BLEND",
			MaskNode::Separate => "SEPARATE",
			MaskNode::Decal => "DECAL",
			MaskNode::MeshMap => "MESH_MAP",
			MaskNode::Filter => "FILTER",
			MaskNode::Mix => "MIX",
		};
		format!("MASK_{role}_{layer}_{mask}")
	}

	pub fn label(&self) -> &'static str {
		match *self {
			MaskNode::Projection => "Mask Projection",
			MaskNode::Value { sample: None } => "Mask Value",
			MaskNode::Value { sample: Some(0) } => "Mask Value X",
			MaskNode::Value { sample: Some(1) } => "Mask Value Y",
			MaskNode::Value { sample: Some(_) } => "Mask Value Z",
			MaskNode::TriplanarBlend => "Mask Triplanar Blend",
			MaskNode::Separate => "Mask Separate",
			MaskNode::Decal => "Mask Decal",
			MaskNode::MeshMap => "Mask Mesh Map",
			MaskNode::Filter => "Mask Filter",
			MaskNode::Mix => "Mask Mix",
		}
	}
}

/// The temporary name a node carries while its entry is being built or moved.
pub fn dirty_name(name: &str) -> String {
	format!("{name}{DIRTY_MARKER}")
}

pub fn is_dirty(name: &str) -> bool {
	name.ends_with(DIRTY_MARKER)
}

/// Marks every name of an entry dirty.
pub fn dirty_names(names: Vec<(material_graph::NodeId, String)>) -> Vec<(material_graph::NodeId, String)> {
	names.into_iter().map(|(node_id, name)| (node_id, dirty_name(&name))).collect()
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn layer_names() {
		assert_eq!(LayerNode::Projection.name(3), "PROJECTION_3");
		assert_eq!(LayerNode::Value { channel: "Color", sample: None }.name(0), "COLOR_VALUE_0");
		assert_eq!(LayerNode::Value { channel: "Color", sample: Some(2) }.name(1), "COLOR_VALUE_1_3");
		assert_eq!(LayerNode::Mix("Base Color").name(12), "BASE_COLOR_MIX_12");
		assert_eq!(LayerNode::Value { channel: "Normal", sample: Some(0) }.label(), "Normal Value X");
	}

	#[test]
	fn mask_names() {
		assert_eq!(MaskNode::Mix.name(2, 0), "MASK_MIX_2_0");
		assert_eq!(MaskNode::Value { sample: Some(1) }.name(0, 4), "MASK_VALUE_0_4_2");
		// Masks of layer 1 never collide with masks of layer 11
		assert_ne!(MaskNode::Filter.name(1, 11), MaskNode::Filter.name(11, 1));
	}

	#[test]
	fn dirty_marker() {
		let name = dirty_name("OPACITY_0");
		assert_eq!(name, "OPACITY_0~");
		assert!(is_dirty(&name));
		assert!(!is_dirty("OPACITY_0"));
	}
}
