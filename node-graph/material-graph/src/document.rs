use crate::templates::{NodeTemplate, TemplateId};
use value::{BlendMode, ImageId, Interpolation, MathOperation, TaggedValue};

use glam::IVec2;
use std::collections::HashMap;
use std::fmt;

pub mod value;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Represents an input socket of a node, indexed by [`DocumentNode::inputs`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputConnector {
	pub node_id: NodeId,
	pub input_index: usize,
}

impl InputConnector {
	pub fn node(node_id: NodeId, input_index: usize) -> Self {
		Self { node_id, input_index }
	}
}

/// Represents an output socket of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputConnector {
	pub node_id: NodeId,
	pub output_index: usize,
}

impl OutputConnector {
	pub fn node(node_id: NodeId, output_index: usize) -> Self {
		Self { node_id, output_index }
	}
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeInput {
	Node { node_id: NodeId, output_index: usize },
	Value { tagged_value: TaggedValue },
}

impl NodeInput {
	pub const fn node(node_id: NodeId, output_index: usize) -> Self {
		Self::Node { node_id, output_index }
	}

	pub const fn value(tagged_value: TaggedValue) -> Self {
		Self::Value { tagged_value }
	}

	pub fn as_upstream(&self) -> Option<OutputConnector> {
		if let &NodeInput::Node { node_id, output_index } = self {
			Some(OutputConnector::node(node_id, output_index))
		} else {
			None
		}
	}

	pub fn as_value(&self) -> Option<&TaggedValue> {
		if let NodeInput::Value { tagged_value } = self { Some(tagged_value) } else { None }
	}

	pub fn is_linked(&self) -> bool {
		matches!(self, NodeInput::Node { .. })
	}
}

/// What a node does. Closed over the node types the material graph uses, so every consumer matches exhaustively.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
	/// An instance of a predefined sub-graph template.
	Group { template: TemplateId },
	/// Samples an image. Inputs: Vector. Outputs: Color, Alpha.
	Texture { image: Option<ImageId>, interpolation: Interpolation },
	/// A constant. Inputs: Value (unlinked). Outputs: Value.
	Constant,
	/// Inputs: Color. Outputs: Red, Green, Blue.
	SeparateColor,
	/// Inputs: Factor, A, B. Outputs: Result.
	Mix { blend_mode: BlendMode },
	/// Inputs: A, B. Outputs: Value.
	Math { operation: MathOperation },
	/// The material's surface shader. One input per material channel. Outputs: Surface.
	Shader { channels: usize },
	/// Inputs: Surface.
	MaterialOutput,
	/// Inputs: Color. Outputs: Surface.
	Emission,
}

impl NodeKind {
	pub fn is_image_sampling(&self) -> bool {
		matches!(self, NodeKind::Texture { .. })
	}

	pub fn template(&self) -> Option<TemplateId> {
		if let NodeKind::Group { template } = self { Some(*template) } else { None }
	}

	/// The default input values and the output count for this kind of node. `None` if the node is a group whose template is unknown.
	pub fn signature(&self, templates: &HashMap<TemplateId, NodeTemplate>) -> Option<(Vec<TaggedValue>, usize)> {
		let signature = match self {
			NodeKind::Group { template } => {
				let template = templates.get(template)?;
				(template.inputs.iter().map(|(_, default)| default.clone()).collect(), template.outputs.len())
			}
			NodeKind::Texture { .. } => (vec![TaggedValue::None], 2),
			NodeKind::Constant => (vec![TaggedValue::F32(0.)], 1),
			NodeKind::SeparateColor => (vec![TaggedValue::Color(glam::Vec4::ZERO)], 3),
			NodeKind::Mix { .. } => (vec![TaggedValue::F32(1.), TaggedValue::None, TaggedValue::None], 1),
			NodeKind::Math { .. } => (vec![TaggedValue::F32(1.), TaggedValue::F32(1.)], 1),
			NodeKind::Shader { channels } => (vec![TaggedValue::None; *channels], 1),
			NodeKind::MaterialOutput => (vec![TaggedValue::None], 0),
			NodeKind::Emission => (vec![TaggedValue::Color(glam::Vec4::ZERO)], 1),
		};
		Some(signature)
	}
}

#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentNodeMetadata {
	pub position: IVec2,
}

impl DocumentNodeMetadata {
	pub fn position(position: impl Into<IVec2>) -> Self {
		Self { position: position.into() }
	}
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentNode {
	/// Unique within a network at rest. Encodes the positional identity of stack nodes.
	pub name: String,
	/// Free-form, user facing.
	pub label: String,
	pub kind: NodeKind,
	pub inputs: Vec<NodeInput>,
	/// The value each input falls back to when it is disconnected.
	pub defaults: Vec<TaggedValue>,
	pub outputs: usize,
	/// Muted nodes stay in the graph but are bypassed by evaluation.
	pub muted: bool,
	pub metadata: DocumentNodeMetadata,
}

impl DocumentNode {
	pub fn new(kind: NodeKind, defaults: Vec<TaggedValue>, outputs: usize) -> Self {
		Self {
			name: String::new(),
			label: String::new(),
			kind,
			inputs: defaults.iter().cloned().map(NodeInput::value).collect(),
			defaults,
			outputs,
			muted: false,
			metadata: DocumentNodeMetadata::default(),
		}
	}

	/// Iterates over the upstream sockets feeding this node, paired with the input index they feed.
	pub fn upstream(&self) -> impl Iterator<Item = (usize, OutputConnector)> + '_ {
		self.inputs.iter().enumerate().filter_map(|(index, input)| input.as_upstream().map(|upstream| (index, upstream)))
	}
}

/// The node graph of one material. Every name lookup is scoped to one network.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeNetwork {
	pub nodes: HashMap<NodeId, DocumentNode>,
	pub templates: HashMap<TemplateId, NodeTemplate>,
	next_node_id: u64,
	next_template_id: u32,
}

impl NodeNetwork {
	pub(crate) fn generate_node_id(&mut self) -> NodeId {
		self.next_node_id += 1;
		NodeId(self.next_node_id)
	}

	pub(crate) fn generate_template_id(&mut self) -> TemplateId {
		self.next_template_id += 1;
		TemplateId(self.next_template_id)
	}

	/// Collect a hashmap of output sockets with a list of the input sockets that use it
	pub fn collect_outward_wires(&self) -> HashMap<OutputConnector, Vec<InputConnector>> {
		let mut outward_wires: HashMap<OutputConnector, Vec<InputConnector>> = HashMap::new();
		for (node_id, node) in &self.nodes {
			for (input_index, upstream) in node.upstream() {
				outward_wires.entry(upstream).or_default().push(InputConnector::node(*node_id, input_index));
			}
		}
		outward_wires
	}

	/// All edges of the network as `(from, to)` pairs, sorted for stable comparison.
	pub fn edges(&self) -> Vec<(OutputConnector, InputConnector)> {
		let mut edges = self
			.nodes
			.iter()
			.flat_map(|(node_id, node)| node.upstream().map(move |(input_index, upstream)| (upstream, InputConnector::node(*node_id, input_index))))
			.collect::<Vec<_>>();
		edges.sort_by_key(|(from, to)| (from.node_id, from.output_index, to.node_id, to.input_index));
		edges
	}

	/// The output socket currently feeding `input`, if it is linked.
	pub fn upstream_output(&self, input: InputConnector) -> Option<OutputConnector> {
		self.nodes.get(&input.node_id)?.inputs.get(input.input_index)?.as_upstream()
	}

	/// Checks if `target` is reachable by walking upstream from `from`.
	pub fn is_upstream_of(&self, target: NodeId, from: NodeId) -> bool {
		let mut stack = vec![from];
		let mut visited = std::collections::HashSet::new();
		while let Some(node_id) = stack.pop() {
			if !visited.insert(node_id) {
				continue;
			}
			let Some(node) = self.nodes.get(&node_id) else { continue };
			for (_, upstream) in node.upstream() {
				if upstream.node_id == target {
					return true;
				}
				stack.push(upstream.node_id);
			}
		}
		false
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::backend::GraphBackend;
	use pretty_assertions::assert_eq;

	#[test]
	fn outward_wires() {
		let mut network = NodeNetwork::default();
		let constant = network.create_node(NodeKind::Constant).unwrap();
		let mix = network.create_node(NodeKind::Mix { blend_mode: BlendMode::Mix }).unwrap();
		let separate = network.create_node(NodeKind::SeparateColor).unwrap();
		network.connect(OutputConnector::node(constant, 0), InputConnector::node(mix, 2)).unwrap();
		network.connect(OutputConnector::node(constant, 0), InputConnector::node(separate, 0)).unwrap();

		let wires = network.collect_outward_wires();
		let mut consumers = wires.get(&OutputConnector::node(constant, 0)).cloned().unwrap_or_default();
		consumers.sort_by_key(|input| input.node_id);
		assert_eq!(consumers, vec![InputConnector::node(mix, 2), InputConnector::node(separate, 0)]);
		assert!(network.is_upstream_of(constant, mix));
		assert!(!network.is_upstream_of(mix, constant));
	}

	#[cfg(feature = "serde")]
	#[test]
	fn network_survives_persistence() {
		let mut network = NodeNetwork::default();
		let texture = network
			.create_node(NodeKind::Texture {
				image: Some(ImageId(7)),
				interpolation: Interpolation::Closest,
			})
			.unwrap();
		network.rename(texture, "COLOR_VALUE_0").unwrap();
		network.set_muted(texture, true).unwrap();

		let json = serde_json::to_string(&network).unwrap();
		let mut restored: NodeNetwork = serde_json::from_str(&json).unwrap();
		assert_eq!(restored, network);
		// Id generation continues past the persisted nodes
		let next = restored.create_node(NodeKind::Constant).unwrap();
		assert!(next > texture);
	}

	#[test]
	fn signature_of_unknown_group() {
		let kind = NodeKind::Group { template: TemplateId(42) };
		assert_eq!(kind.signature(&HashMap::new()), None);
		assert_eq!(NodeKind::SeparateColor.signature(&HashMap::new()).map(|(_, outputs)| outputs), Some(3));
	}
}
