use crate::messages::material::node_graph::isolation::Isolation;
use crate::messages::material::utility_types::stack::MeshMapType;

use material_graph::ImageId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One image to bake. Each job isolates its target in the material output for the duration of the bake.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BakeJob {
	/// The combined value of a material channel.
	Channel { channel: String },
	MeshMap { map: MeshMapType },
}

impl BakeJob {
	/// What the material output must show while this job bakes.
	pub fn isolation(&self) -> Isolation {
		match self {
			BakeJob::Channel { channel } => Isolation::Channel { channel: channel.clone() },
			BakeJob::MeshMap { map } => Isolation::MeshMap { map: *map },
		}
	}
}

impl fmt::Display for BakeJob {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			BakeJob::Channel { channel } => write!(f, "{channel} channel"),
			BakeJob::MeshMap { map } => write!(f, "{map} map"),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BakeStatus {
	Running,
	Finished(ImageId),
	Failed(String),
}

/// The host's renderer, baking one job at a time in the background.
pub trait BakeRunner {
	/// Starts baking `job` from the current state of the material.
	fn start(&mut self, job: &BakeJob) -> Result<(), String>;
	fn poll(&mut self) -> BakeStatus;
	fn cancel(&mut self);
}
