use crate::application::Editor;
use crate::dispatcher::EditorBackends;
use crate::messages::bake::{BakeJob, BakeRunner, BakeStatus};
use crate::messages::material::node_graph::node_definitions::default_asset_library;
use crate::messages::material::utility_types::stack::LayerStack;
use crate::messages::prelude::*;

use material_graph::{GraphBackend, ImageId, InputConnector, NodeId, NodeNetwork, OutputConnector, Scene, TemplateLibrary};

/// A bake runner that finishes each job after a fixed number of polls, handing out increasing image ids.
#[derive(Debug, Default)]
pub struct ScriptedBakeRunner {
	pub started: Vec<BakeJob>,
	/// How many polls report `Running` before a job finishes.
	pub polls_per_job: usize,
	/// Fails the next job when it is started.
	pub fail_next: Option<String>,
	pub cancelled: bool,
	polls: usize,
	next_image: u64,
}

impl BakeRunner for ScriptedBakeRunner {
	fn start(&mut self, job: &BakeJob) -> Result<(), String> {
		if let Some(reason) = self.fail_next.take() {
			return Err(reason);
		}
		self.started.push(job.clone());
		self.polls = 0;
		Ok(())
	}

	fn poll(&mut self) -> BakeStatus {
		if self.polls < self.polls_per_job {
			self.polls += 1;
			return BakeStatus::Running;
		}
		self.next_image += 1;
		BakeStatus::Finished(ImageId(100 + self.next_image))
	}

	fn cancel(&mut self) {
		self.cancelled = true;
	}
}

/// A set of utility functions to make the writing of layer stack tests more declarative
pub struct StackTestUtils {
	pub editor: Editor,
	pub network: NodeNetwork,
	pub assets: TemplateLibrary,
	pub scene: Scene,
	pub runner: ScriptedBakeRunner,
}

impl StackTestUtils {
	pub fn create() -> Self {
		Self::with_assets(default_asset_library())
	}

	pub fn with_assets(assets: TemplateLibrary) -> Self {
		let _ = env_logger::builder().is_test(true).try_init();

		Self {
			editor: Editor::default(),
			network: NodeNetwork::default(),
			assets,
			scene: Scene::default(),
			runner: ScriptedBakeRunner::default(),
		}
	}

	pub fn handle_message(&mut self, message: impl Into<Message>) -> Vec<StackResponse> {
		let mut backends = EditorBackends {
			network: &mut self.network,
			assets: &mut self.assets,
			scene: &mut self.scene,
			runner: &mut self.runner,
		};
		self.editor.handle_message(message, &mut backends)
	}

	/// Handles `message`, panicking if any operation failed.
	pub fn handle_ok(&mut self, message: impl Into<Message>) -> Vec<StackResponse> {
		let responses = self.handle_message(message);
		if let Some(error) = failure(&responses) {
			panic!("Operation failed: {error}");
		}
		responses
	}

	pub fn stack(&self) -> &LayerStack {
		&self.editor.material().layer_stack
	}

	pub fn node_named(&self, name: &str) -> NodeId {
		match self.network.nodes_named(name).as_slice() {
			[node_id] => *node_id,
			nodes => panic!("Expected exactly one node named \"{name}\", found {}", nodes.len()),
		}
	}

	pub fn has_node(&self, name: &str) -> bool {
		!self.network.nodes_named(name).is_empty()
	}

	pub fn name_of(&self, node_id: NodeId) -> &str {
		&self.network.node(node_id).expect("node should exist").name
	}

	/// The name of the node feeding `input` of the node called `node`, and the output it is read from.
	pub fn upstream(&self, node: &str, input_index: usize) -> Option<(String, usize)> {
		let upstream = self.network.upstream_output(InputConnector::node(self.node_named(node), input_index))?;
		Some((self.name_of(upstream.node_id).to_string(), upstream.output_index))
	}

	pub fn feeds(&self, from: &str, output_index: usize, to: &str, input_index: usize) -> bool {
		let from = OutputConnector::node(self.node_named(from), output_index);
		self.network.upstream_output(InputConnector::node(self.node_named(to), input_index)) == Some(from)
	}

	/// Every edge of the network by node names, so graphs built from different node ids can be compared.
	pub fn named_edges(&self) -> Vec<(String, usize, String, usize)> {
		let mut edges = self
			.network
			.edges()
			.into_iter()
			.map(|(from, to)| (self.name_of(from.node_id).to_string(), from.output_index, self.name_of(to.node_id).to_string(), to.input_index))
			.collect::<Vec<_>>();
		edges.sort();
		edges
	}

	/// Asserts that every layer, and every mask of each layer, carries the names of its position and nothing more.
	pub fn assert_contiguous(&self) {
		let stack = self.stack();
		for (index, layer) in stack.layers.iter().enumerate() {
			for (node_id, name) in layer.named_nodes(index) {
				assert_eq!(self.name_of(node_id), name, "layer {index} should own \"{name}\"");
				assert_eq!(self.network.nodes_named(&name).len(), 1, "\"{name}\" should be unique");
			}
		}
		assert!(!self.has_node(&format!("PROJECTION_{}", stack.len())), "no layer should exist above the top of the stack");
		assert!(self.network.nodes.values().all(|node| !node.name.ends_with(crate::consts::DIRTY_MARKER)), "no node should keep a dirty name");
	}
}

/// The error of the first failed operation among `responses`.
pub fn failure(responses: &[StackResponse]) -> Option<&StackError> {
	responses.iter().find_map(|response| match response {
		StackResponse::OperationFailed { error, .. } => Some(error),
		_ => None,
	})
}
