use super::BakeJob;

use serde::{Deserialize, Serialize};

#[derive(PartialEq, Clone, Debug, Serialize, Deserialize)]
pub enum BakeMessage {
	/// Queues `jobs`, baking them one after another.
	Start { jobs: Vec<BakeJob> },
	/// Sent by the host's timer while a bake is running.
	Tick,
	Cancel,
}
