use crate::error::StackError;
use crate::messages::bake::BakeJob;
use crate::messages::material::node_graph::isolation::Isolation;
use crate::messages::material::utility_types::stack::OutputChannel;

use material_graph::ImageId;
use std::fmt;

/// What the host is told after a message has been processed.
#[derive(Clone, Debug, PartialEq)]
pub enum StackResponse {
	/// The stack was rebuilt, reindexed or relinked, so any displayed stack must be redrawn.
	LayerStackChanged,
	LayerSelected { layer: Option<usize> },
	MaskSelected { layer: usize, mask: Option<usize> },
	/// The output channel actually in use, which differs from the requested one after a fallback.
	OutputChannelChanged {
		layer: usize,
		mask: Option<usize>,
		channel: Option<String>,
		output_channel: OutputChannel,
	},
	IsolationChanged { isolation: Option<Isolation> },
	MeshMapsApplied { nodes: usize },
	PreferencesChanged,
	BakeStarted { job: BakeJob },
	BakeJobFinished { job: BakeJob, image: ImageId },
	BakeFinished,
	BakeFailed { job: BakeJob, reason: String },
	BakeCancelled,
	/// A status message naming the failed operation. Nothing else is reported for that operation.
	OperationFailed {
		operation: String,
		layer: Option<usize>,
		mask: Option<usize>,
		error: StackError,
	},
}

impl fmt::Display for StackResponse {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			StackResponse::LayerStackChanged => write!(f, "LayerStackChanged"),
			StackResponse::LayerSelected { layer } => write!(f, "LayerSelected({layer:?})"),
			StackResponse::MaskSelected { layer, mask } => write!(f, "MaskSelected({layer}, {mask:?})"),
			StackResponse::OutputChannelChanged { layer, mask, channel, output_channel } => write!(f, "OutputChannelChanged({layer}, {mask:?}, {channel:?}, {output_channel})"),
			StackResponse::IsolationChanged { isolation } => write!(f, "IsolationChanged({isolation:?})"),
			StackResponse::MeshMapsApplied { nodes } => write!(f, "MeshMapsApplied({nodes})"),
			StackResponse::PreferencesChanged => write!(f, "PreferencesChanged"),
			StackResponse::BakeStarted { job } => write!(f, "BakeStarted({job})"),
			StackResponse::BakeJobFinished { job, image } => write!(f, "BakeJobFinished({job}, {image})"),
			StackResponse::BakeFinished => write!(f, "BakeFinished"),
			StackResponse::BakeFailed { job, reason } => write!(f, "BakeFailed({job}): {reason}"),
			StackResponse::BakeCancelled => write!(f, "BakeCancelled"),
			StackResponse::OperationFailed { operation, layer, mask, error } => {
				write!(f, "{operation} failed")?;
				match (layer, mask) {
					(Some(layer), Some(mask)) => write!(f, " on mask {mask} of layer {layer}")?,
					(Some(layer), None) => write!(f, " on layer {layer}")?,
					_ => {}
				}
				write!(f, ": {error}")
			}
		}
	}
}
