use super::naming::{LayerNode, MaskNode};
use crate::error::{StackError, check_index};

use material_graph::{BlendMode, NodeId, ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The sampling topology used to fetch the values of a layer or mask.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum ProjectionMode {
	#[default]
	#[strum(to_string = "UV")]
	UV,
	Triplanar,
	/// Projects from an anchor object in the scene. Layers only.
	Decal,
}

/// Which part of a channel's source feeds the rest of the channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum OutputChannel {
	#[default]
	Color,
	Alpha,
	Red,
	Green,
	Blue,
}

impl OutputChannel {
	/// The output of a channel separator carrying this component.
	pub fn separator_output(&self) -> Option<usize> {
		match self {
			OutputChannel::Red => Some(0),
			OutputChannel::Green => Some(1),
			OutputChannel::Blue => Some(2),
			OutputChannel::Color | OutputChannel::Alpha => None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum LayerKind {
	/// Constant values in every channel.
	#[default]
	Material,
	/// A painted or imported image in the base color channel.
	Image,
	/// An image projected from an anchor object.
	Decal,
}

/// A texture baked from the mesh itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::Display, strum::EnumIter, strum::EnumString)]
pub enum MeshMapType {
	#[strum(to_string = "Ambient Occlusion")]
	AmbientOcclusion,
	Curvature,
	Thickness,
	#[strum(to_string = "World Space Normals")]
	WorldSpaceNormals,
}

const MESH_MAP_KIND_PREFIX: &str = "Mesh Map: ";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MaskKind {
	/// An image without anything bound to it yet.
	#[default]
	Empty,
	Black,
	White,
	Gradient,
	Decal,
	Grunge,
	EdgeWear,
	MeshMapDriven(MeshMapType),
}

impl fmt::Display for MaskKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			MaskKind::Empty => write!(f, "Empty"),
			MaskKind::Black => write!(f, "Black"),
			MaskKind::White => write!(f, "White"),
			MaskKind::Gradient => write!(f, "Gradient"),
			MaskKind::Decal => write!(f, "Decal"),
			MaskKind::Grunge => write!(f, "Grunge"),
			MaskKind::EdgeWear => write!(f, "Edge Wear"),
			MaskKind::MeshMapDriven(map) => write!(f, "{MESH_MAP_KIND_PREFIX}{map}"),
		}
	}
}

impl FromStr for MaskKind {
	type Err = strum::ParseError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let kind = match s {
			"Empty" => MaskKind::Empty,
			"Black" => MaskKind::Black,
			"White" => MaskKind::White,
			"Gradient" => MaskKind::Gradient,
			"Decal" => MaskKind::Decal,
			"Grunge" => MaskKind::Grunge,
			"Edge Wear" => MaskKind::EdgeWear,
			_ => {
				let map = s.strip_prefix(MESH_MAP_KIND_PREFIX).ok_or(strum::ParseError::VariantNotFound)?;
				MaskKind::MeshMapDriven(map.parse()?)
			}
		};
		Ok(kind)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveDirection {
	/// Towards the top of the stack, to a higher index.
	Up,
	/// Towards the bottom of the stack, to a lower index.
	Down,
}

/// Handles to the nodes that make up one sampled source: the value node(s), and the blend node combining them under triplanar projection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceNodes {
	/// One node, or three samples under triplanar projection.
	pub values: Vec<NodeId>,
	pub triplanar_blend: Option<NodeId>,
	pub separate: Option<NodeId>,
}

impl SourceNodes {
	/// The node whose outputs are the channel's source.
	pub fn source(&self) -> Option<NodeId> {
		self.triplanar_blend.or_else(|| self.values.first().copied())
	}

	fn map_nodes(&mut self, map: &impl Fn(NodeId) -> NodeId) {
		self.values.iter_mut().for_each(|node_id| *node_id = map(*node_id));
		self.triplanar_blend = self.triplanar_blend.map(map);
		self.separate = self.separate.map(map);
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelNodes {
	pub source: SourceNodes,
	/// Present only on normal channels under UV projection.
	pub rotation_fix: Option<NodeId>,
	pub filter: NodeId,
	pub opacity: NodeId,
	pub mix: NodeId,
}

/// One material channel of a layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
	pub name: String,
	pub normal: bool,
	pub filter_active: bool,
	pub blend_mode: BlendMode,
	pub output_channel: OutputChannel,
	pub image_alpha_blend_enabled: bool,
	pub nodes: ChannelNodes,
}

impl Channel {
	pub fn value_node_count(&self) -> usize {
		self.nodes.source.values.len()
	}

	pub fn named_nodes(&self, layer: usize) -> Vec<(NodeId, String)> {
		let channel = self.name.as_str();
		let nodes = &self.nodes;
		let mut named = Vec::new();
		match nodes.source.values.as_slice() {
			[single] => named.push((*single, LayerNode::Value { channel, sample: None }.name(layer))),
			samples => named.extend(samples.iter().enumerate().map(|(sample, node_id)| (*node_id, LayerNode::Value { channel, sample: Some(sample) }.name(layer)))),
		}
		named.extend(nodes.source.triplanar_blend.map(|node_id| (node_id, LayerNode::TriplanarBlend(channel).name(layer))));
		named.extend(nodes.source.separate.map(|node_id| (node_id, LayerNode::Separate(channel).name(layer))));
		named.extend(nodes.rotation_fix.map(|node_id| (node_id, LayerNode::RotationFix(channel).name(layer))));
		named.push((nodes.filter, LayerNode::Filter(channel).name(layer)));
		named.push((nodes.opacity, LayerNode::ChannelOpacity(channel).name(layer)));
		named.push((nodes.mix, LayerNode::Mix(channel).name(layer)));
		named
	}

	fn map_nodes(&mut self, map: &impl Fn(NodeId) -> NodeId) {
		let nodes = &mut self.nodes;
		nodes.source.map_nodes(map);
		nodes.rotation_fix = nodes.rotation_fix.map(map);
		nodes.filter = map(nodes.filter);
		nodes.opacity = map(nodes.opacity);
		nodes.mix = map(nodes.mix);
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaskNodes {
	pub projection: NodeId,
	pub source: SourceNodes,
	/// The decal projection driving a decal mask.
	pub decal: Option<NodeId>,
	/// The curvature map read by an edge wear mask.
	pub mesh_map: Option<NodeId>,
	pub filter: NodeId,
	pub mix: NodeId,
}

/// One entry of a layer's mask stack, modulating the layer's opacity.
#[derive(Clone, Debug, PartialEq)]
pub struct Mask {
	pub kind: MaskKind,
	pub projection_mode: ProjectionMode,
	pub output_channel: OutputChannel,
	pub hidden: bool,
	pub decal_anchor: Option<ObjectId>,
	pub nodes: MaskNodes,
}

impl Mask {
	pub fn named_nodes(&self, layer: usize, mask: usize) -> Vec<(NodeId, String)> {
		let nodes = &self.nodes;
		let mut named = vec![(nodes.projection, MaskNode::Projection.name(layer, mask))];
		match nodes.source.values.as_slice() {
			[single] => named.push((*single, MaskNode::Value { sample: None }.name(layer, mask))),
			samples => named.extend(samples.iter().enumerate().map(|(sample, node_id)| (*node_id, MaskNode::Value { sample: Some(sample) }.name(layer, mask)))),
		}
		named.extend(nodes.source.triplanar_blend.map(|node_id| (node_id, MaskNode::TriplanarBlend.name(layer, mask))));
		named.extend(nodes.source.separate.map(|node_id| (node_id, MaskNode::Separate.name(layer, mask))));
		named.extend(nodes.decal.map(|node_id| (node_id, MaskNode::Decal.name(layer, mask))));
		named.extend(nodes.mesh_map.map(|node_id| (node_id, MaskNode::MeshMap.name(layer, mask))));
		named.push((nodes.filter, MaskNode::Filter.name(layer, mask)));
		named.push((nodes.mix, MaskNode::Mix.name(layer, mask)));
		named
	}

	pub fn node_ids(&self) -> Vec<NodeId> {
		self.named_nodes(0, 0).into_iter().map(|(node_id, _)| node_id).collect()
	}

	pub(crate) fn map_nodes(&mut self, map: &impl Fn(NodeId) -> NodeId) {
		let nodes = &mut self.nodes;
		nodes.projection = map(nodes.projection);
		nodes.source.map_nodes(map);
		nodes.decal = nodes.decal.map(map);
		nodes.mesh_map = nodes.mesh_map.map(map);
		nodes.filter = map(nodes.filter);
		nodes.mix = map(nodes.mix);
	}
}

/// The ordered masks of one layer. Index 0 is the bottom of the stack.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaskStack {
	pub masks: Vec<Mask>,
	pub selected: Option<usize>,
}

impl MaskStack {
	pub fn len(&self) -> usize {
		self.masks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.masks.is_empty()
	}

	pub fn get(&self, index: usize) -> Result<&Mask, StackError> {
		check_index(index, self.masks.len())?;
		Ok(&self.masks[index])
	}

	pub fn get_mut(&mut self, index: usize) -> Result<&mut Mask, StackError> {
		check_index(index, self.masks.len())?;
		Ok(&mut self.masks[index])
	}
}

/// One entry of the material's layer stack.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
	pub kind: LayerKind,
	pub active: bool,
	pub projection_mode: ProjectionMode,
	/// Owned by the scene. The layer only refers to it.
	pub decal_anchor: Option<ObjectId>,
	pub projection: NodeId,
	/// Multiplies the layer's opacity with the combined output of its masks.
	pub opacity: NodeId,
	/// Clips a decal layer to the decal's bounds.
	pub decal_mask: Option<NodeId>,
	pub channels: Vec<Channel>,
	pub masks: MaskStack,
}

impl Layer {
	/// Every node of the layer with the name it carries at stack position `layer`, the nodes of its masks included.
	pub fn named_nodes(&self, layer: usize) -> Vec<(NodeId, String)> {
		let mut named = vec![(self.projection, LayerNode::Projection.name(layer)), (self.opacity, LayerNode::Opacity.name(layer))];
		named.extend(self.decal_mask.map(|node_id| (node_id, LayerNode::DecalMask.name(layer))));
		named.extend(self.channels.iter().flat_map(|channel| channel.named_nodes(layer)));
		named.extend(self.masks.masks.iter().enumerate().flat_map(|(mask_index, mask)| mask.named_nodes(layer, mask_index)));
		named
	}

	pub fn node_ids(&self) -> Vec<NodeId> {
		self.named_nodes(0).into_iter().map(|(node_id, _)| node_id).collect()
	}

	pub fn channel(&self, name: &str) -> Result<&Channel, StackError> {
		self.channels.iter().find(|channel| channel.name == name).ok_or_else(|| StackError::UnknownChannel(name.to_string()))
	}

	pub fn channel_index(&self, name: &str) -> Result<usize, StackError> {
		self.channels.iter().position(|channel| channel.name == name).ok_or_else(|| StackError::UnknownChannel(name.to_string()))
	}

	/// A copy of this layer referring to other nodes, e.g. the copies made by duplicating its sub-graph.
	pub fn remapped(&self, map: &HashMap<NodeId, NodeId>) -> Self {
		let map = |node_id: NodeId| map.get(&node_id).copied().unwrap_or(node_id);
		let mut layer = self.clone();
		layer.projection = map(layer.projection);
		layer.opacity = map(layer.opacity);
		layer.decal_mask = layer.decal_mask.map(map);
		layer.channels.iter_mut().for_each(|channel| channel.map_nodes(&map));
		layer.masks.masks.iter_mut().for_each(|mask| mask.map_nodes(&map));
		layer
	}
}

/// The nodes every material has exactly one of.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterialRoot {
	pub shader: NodeId,
	pub output: NodeId,
}

/// The ordered layers of one material. Index 0 is the bottom of the stack, the top layer feeds the shader.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerStack {
	pub layers: Vec<Layer>,
	pub selected: Option<usize>,
	/// Created together with the first layer.
	pub root: Option<MaterialRoot>,
}

impl LayerStack {
	pub fn len(&self) -> usize {
		self.layers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.layers.is_empty()
	}

	pub fn get(&self, index: usize) -> Result<&Layer, StackError> {
		check_index(index, self.layers.len())?;
		Ok(&self.layers[index])
	}

	pub fn get_mut(&mut self, index: usize) -> Result<&mut Layer, StackError> {
		check_index(index, self.layers.len())?;
		Ok(&mut self.layers[index])
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use pretty_assertions::assert_eq;

	#[test]
	fn mask_kind_labels() {
		for kind in [MaskKind::Empty, MaskKind::EdgeWear, MaskKind::MeshMapDriven(MeshMapType::AmbientOcclusion)] {
			assert_eq!(kind.to_string().parse::<MaskKind>(), Ok(kind));
		}
		assert_eq!(MaskKind::MeshMapDriven(MeshMapType::WorldSpaceNormals).to_string(), "Mesh Map: World Space Normals");
		assert!("Mesh Map: Albedo".parse::<MaskKind>().is_err());
		assert_eq!("UV".parse::<ProjectionMode>(), Ok(ProjectionMode::UV));
	}

	#[test]
	fn separator_outputs() {
		assert_eq!(OutputChannel::Green.separator_output(), Some(1));
		assert_eq!(OutputChannel::Alpha.separator_output(), None);
	}
}
