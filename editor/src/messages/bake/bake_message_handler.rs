use super::{BakeJob, BakeRunner, BakeStatus};
use crate::messages::material::node_graph::isolation::Isolation;
use crate::messages::material::utility_types::mesh_maps::MeshMaps;
use crate::messages::prelude::*;

pub struct BakeMessageContext<'a> {
	pub runner: &'a mut dyn BakeRunner,
	/// The contribution the material output currently shows.
	pub isolation: Option<&'a Isolation>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum BakeState {
	#[default]
	Idle,
	/// The job's isolation has been requested, the runner starts on the next tick.
	Isolating(BakeJob),
	Running(BakeJob),
}

/// Drives a queue of bake jobs from the host's timer ticks. Every job isolates its target first, and the material output is restored once the
/// queue finishes, fails or is cancelled.
#[derive(Debug, Default)]
pub struct BakeMessageHandler {
	state: BakeState,
	queue: VecDeque<BakeJob>,
	baked_maps: MeshMaps,
}

impl<'a> MessageHandler<BakeMessage, BakeMessageContext<'a>> for BakeMessageHandler {
	fn process_message(&mut self, message: BakeMessage, responses: &mut VecDeque<Message>, context: BakeMessageContext<'a>) {
		let BakeMessageContext { runner, isolation } = context;

		match message {
			BakeMessage::Start { jobs } => {
				if self.is_baking() {
					warn!("A bake is already running, ignoring {} new jobs", jobs.len());
					return;
				}
				self.queue = jobs.into();
				self.baked_maps = MeshMaps::default();
				self.next_job(responses);
			}
			BakeMessage::Tick => match std::mem::take(&mut self.state) {
				BakeState::Idle => {}
				BakeState::Isolating(job) if isolation != Some(&job.isolation()) => {
					let reason = format!("Could not isolate the {job}");
					self.fail(job, reason, responses);
				}
				BakeState::Isolating(job) => match runner.start(&job) {
					Ok(()) => self.state = BakeState::Running(job),
					Err(reason) => self.fail(job, reason, responses),
				},
				BakeState::Running(job) => match runner.poll() {
					BakeStatus::Running => self.state = BakeState::Running(job),
					BakeStatus::Finished(image) => {
						debug!("Baked the {job}");
						if let BakeJob::MeshMap { map } = job {
							self.baked_maps.insert(map, image);
						}
						responses.push_back(StackResponse::BakeJobFinished { job, image }.into());
						self.next_job(responses);
					}
					BakeStatus::Failed(reason) => self.fail(job, reason, responses),
				},
			},
			BakeMessage::Cancel => {
				if !self.is_baking() {
					return;
				}
				if matches!(self.state, BakeState::Running(_)) {
					runner.cancel();
				}
				info!("Cancelled the bake with {} jobs left", self.queue.len());
				self.state = BakeState::Idle;
				self.queue.clear();
				responses.push_back(MaterialMessage::ShowLayer.into());
				responses.push_back(StackResponse::BakeCancelled.into());
			}
		}
	}
}

impl BakeMessageHandler {
	pub fn is_baking(&self) -> bool {
		self.state != BakeState::Idle
	}

	/// Isolates the next queued job, or restores the material and applies the baked mesh maps once the queue is empty.
	fn next_job(&mut self, responses: &mut VecDeque<Message>) {
		let Some(job) = self.queue.pop_front() else {
			self.state = BakeState::Idle;
			responses.push_back(MaterialMessage::ShowLayer.into());
			if !self.baked_maps.is_empty() {
				let maps = std::mem::take(&mut self.baked_maps);
				responses.push_back(MaterialMessage::ApplyMeshMaps { maps }.into());
			}
			responses.push_back(StackResponse::BakeFinished.into());
			return;
		};

		let isolation = match job.isolation() {
			Isolation::Channel { channel } => MaterialMessage::IsolateChannel { channel },
			Isolation::Mask { layer, mask } => MaterialMessage::IsolateMask { layer, mask },
			Isolation::MeshMap { map } => MaterialMessage::IsolateMeshMap { map },
		};
		responses.push_back(isolation.into());
		responses.push_back(StackResponse::BakeStarted { job: job.clone() }.into());
		self.state = BakeState::Isolating(job);
	}

	fn fail(&mut self, job: BakeJob, reason: String, responses: &mut VecDeque<Message>) {
		log::error!("Baking the {job} failed: {reason}");
		self.state = BakeState::Idle;
		self.queue.clear();
		responses.push_back(MaterialMessage::ShowLayer.into());
		responses.push_back(StackResponse::BakeFailed { job, reason }.into());
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::messages::material::utility_types::stack::{LayerKind, MaskKind, MeshMapType};
	use crate::test_utils::{StackTestUtils, failure};
	use material_graph::{GraphBackend, ImageId, NodeKind};
	use pretty_assertions::assert_eq;

	fn material_with_edge_wear() -> StackTestUtils {
		let mut utils = StackTestUtils::create();
		utils.handle_ok(MaterialMessage::AddLayer {
			kind: LayerKind::Material,
			insert_index: None,
		});
		utils.handle_ok(MaterialMessage::AddMask {
			layer: 0,
			kind: MaskKind::EdgeWear,
			insert_index: None,
		});
		utils
	}

	#[test]
	fn baking_mesh_maps() {
		let mut utils = material_with_edge_wear();
		utils.runner.polls_per_job = 1;
		let job = BakeJob::MeshMap { map: MeshMapType::Curvature };

		let responses = utils.handle_ok(BakeMessage::Start { jobs: vec![job.clone()] });
		assert_eq!(
			responses,
			vec![
				StackResponse::IsolationChanged {
					isolation: Some(Isolation::MeshMap { map: MeshMapType::Curvature }),
				},
				StackResponse::BakeStarted { job: job.clone() },
			]
		);
		assert!(utils.editor.is_baking());
		assert!(utils.feeds("MESH_MAP_BAKE", 0, "PREVIEW_EMISSION", 0));
		// The runner only starts once the isolation is in place
		assert!(utils.runner.started.is_empty());

		assert_eq!(utils.handle_ok(BakeMessage::Tick), Vec::new());
		assert_eq!(utils.runner.started, vec![job.clone()]);
		assert_eq!(utils.handle_ok(BakeMessage::Tick), Vec::new());

		let responses = utils.handle_ok(BakeMessage::Tick);
		assert_eq!(
			responses,
			vec![
				StackResponse::BakeJobFinished { job, image: ImageId(101) },
				StackResponse::IsolationChanged { isolation: None },
				StackResponse::MeshMapsApplied { nodes: 1 },
				StackResponse::BakeFinished,
			]
		);
		assert!(!utils.editor.is_baking());
		assert!(!utils.has_node("MESH_MAP_BAKE"));
		assert!(utils.feeds("MATERIAL_SHADER", 0, "MATERIAL_OUTPUT", 0));
		let mesh_map = utils.network.node(utils.node_named("MASK_MESH_MAP_0_0")).unwrap();
		assert!(matches!(mesh_map.kind, NodeKind::Texture { image: Some(ImageId(101)), .. }));
	}

	#[test]
	fn jobs_run_one_after_another() {
		let mut utils = material_with_edge_wear();
		let jobs = vec![BakeJob::Channel { channel: "Color".to_string() }, BakeJob::Channel { channel: "Roughness".to_string() }];
		utils.handle_ok(BakeMessage::Start { jobs: jobs.clone() });
		assert!(utils.feeds("COLOR_MIX_0", 0, "PREVIEW_EMISSION", 0));

		utils.handle_ok(BakeMessage::Tick);
		let responses = utils.handle_ok(BakeMessage::Tick);
		assert_eq!(responses.last(), Some(&StackResponse::BakeStarted { job: jobs[1].clone() }));
		assert!(utils.feeds("ROUGHNESS_MIX_0", 0, "PREVIEW_EMISSION", 0));

		// A second bake is ignored while the first one runs
		assert_eq!(utils.handle_ok(BakeMessage::Start { jobs: jobs.clone() }), Vec::new());

		utils.handle_ok(BakeMessage::Tick);
		let responses = utils.handle_ok(BakeMessage::Tick);
		// Channel bakes leave the mesh maps alone
		assert_eq!(responses.last(), Some(&StackResponse::BakeFinished));
		assert!(!responses.iter().any(|response| matches!(response, StackResponse::MeshMapsApplied { .. })));
		assert_eq!(utils.runner.started, jobs);
	}

	#[test]
	fn jobs_whose_target_cannot_be_isolated_never_start() {
		let mut utils = StackTestUtils::create();
		utils.handle_ok(MaterialMessage::AddLayer {
			kind: LayerKind::Material,
			insert_index: None,
		});
		let job = BakeJob::Channel { channel: "Sheen".to_string() };

		let responses = utils.handle_message(BakeMessage::Start {
			jobs: vec![job.clone(), BakeJob::Channel { channel: "Color".to_string() }],
		});
		assert_eq!(failure(&responses), Some(&StackError::UnknownChannel("Sheen".to_string())));

		let responses = utils.handle_ok(BakeMessage::Tick);
		assert_eq!(
			responses,
			vec![StackResponse::BakeFailed {
				job,
				reason: "Could not isolate the Sheen channel".to_string(),
			}]
		);
		assert!(utils.runner.started.is_empty());
		assert!(!utils.editor.is_baking());
		assert!(utils.feeds("MATERIAL_SHADER", 0, "MATERIAL_OUTPUT", 0));
		assert_eq!(utils.handle_ok(BakeMessage::Tick), Vec::new());
	}

	#[test]
	fn failed_bakes_restore_the_material() {
		let mut utils = material_with_edge_wear();
		utils.runner.fail_next = Some("out of memory".to_string());
		let job = BakeJob::Channel { channel: "Metallic".to_string() };
		utils.handle_ok(BakeMessage::Start {
			jobs: vec![job.clone(), BakeJob::Channel { channel: "Color".to_string() }],
		});

		let responses = utils.handle_ok(BakeMessage::Tick);
		assert_eq!(
			responses,
			vec![
				StackResponse::IsolationChanged { isolation: None },
				StackResponse::BakeFailed {
					job,
					reason: "out of memory".to_string(),
				},
			]
		);
		assert!(!utils.editor.is_baking());
		assert!(!utils.has_node("PREVIEW_EMISSION"));
		assert_eq!(utils.handle_ok(BakeMessage::Tick), Vec::new());
	}

	#[test]
	fn cancelling_a_bake() {
		let mut utils = material_with_edge_wear();
		utils.runner.polls_per_job = 10;
		utils.handle_ok(BakeMessage::Start {
			jobs: vec![BakeJob::MeshMap { map: MeshMapType::AmbientOcclusion }],
		});
		utils.handle_ok(BakeMessage::Tick);

		let responses = utils.handle_ok(BakeMessage::Cancel);
		assert_eq!(responses, vec![StackResponse::IsolationChanged { isolation: None }, StackResponse::BakeCancelled]);
		assert!(utils.runner.cancelled);
		assert!(!utils.editor.is_baking());
		assert!(utils.feeds("MATERIAL_SHADER", 0, "MATERIAL_OUTPUT", 0));

		// Nothing to cancel anymore
		assert_eq!(utils.handle_ok(BakeMessage::Cancel), Vec::new());
	}
}
