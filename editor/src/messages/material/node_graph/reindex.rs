//! Renumbers the positional names of a stack after an entry is inserted, removed or moved.
//!
//! A [`RenamePlan`] lists every rename in the order it will be applied. It is checked against a simulation of the network's names before
//! anything is renamed, so a plan either applies completely or is rejected without touching the graph.

use crate::error::StackError;
use crate::messages::material::utility_types::naming::dirty_names;

use material_graph::{GraphBackend, NodeId};
use std::collections::{HashMap, HashSet};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rename {
	pub node_id: NodeId,
	pub from: String,
	pub to: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenamePlan {
	steps: Vec<Rename>,
	/// Nodes that will be removed before the plan is committed, releasing their names.
	vacated: HashSet<NodeId>,
}

impl RenamePlan {
	pub fn steps(&self) -> &[Rename] {
		&self.steps
	}

	pub fn vacate(&mut self, nodes: impl IntoIterator<Item = NodeId>) {
		self.vacated.extend(nodes);
	}

	/// Renames every node of an entry from its `from` name to its `to` name. Both lists come from the same entry, so they pair up by position.
	fn rename_entry(&mut self, from: Vec<(NodeId, String)>, to: Vec<(NodeId, String)>) {
		for ((node_id, from), (other, to)) in from.into_iter().zip(to) {
			debug_assert_eq!(node_id, other);
			if from != to {
				self.steps.push(Rename { node_id, from, to });
			}
		}
	}

	/// Simulates the plan on the current names of `network`, failing if a node is missing, carries an unexpected name, or would take a name still in use.
	pub fn validate(&self, network: &dyn GraphBackend) -> Result<(), StackError> {
		let mut renamed: HashMap<NodeId, &str> = HashMap::new();
		let current_name = |renamed: &HashMap<NodeId, &str>, node_id: NodeId| -> Option<String> {
			match renamed.get(&node_id) {
				Some(name) => Some(name.to_string()),
				None => network.node(node_id).map(|node| node.name.clone()),
			}
		};

		for step in &self.steps {
			if self.vacated.contains(&step.node_id) || current_name(&renamed, step.node_id).as_deref() != Some(step.from.as_str()) {
				return Err(StackError::MissingNode { name: step.from.clone() });
			}

			let taken_in_network = network
				.nodes_named(&step.to)
				.into_iter()
				.any(|holder| holder != step.node_id && !self.vacated.contains(&holder) && !renamed.contains_key(&holder));
			let taken_by_plan = renamed.iter().any(|(holder, name)| *holder != step.node_id && *name == step.to);
			if taken_in_network || taken_by_plan {
				return Err(StackError::DuplicateName { name: step.to.clone() });
			}

			renamed.insert(step.node_id, &step.to);
		}
		Ok(())
	}

	/// Applies every rename. Only call this after [`Self::validate`] succeeded against the same network.
	pub fn commit(self, network: &mut dyn GraphBackend) -> Result<(), StackError> {
		for Rename { node_id, from, to } in self.steps {
			trace!("Renaming \"{from}\" to \"{to}\"");
			network.rename(node_id, &to)?;
		}
		Ok(())
	}
}

/// Plans the insertion of `inserted`, whose nodes carry dirty names, at index `at` of `entries`.
///
/// Existing entries from the top down to `at` move up by one, each into the name the previous step vacated, then the new entry takes the names of `at`.
pub fn plan_insert<E>(entries: &[E], inserted: &E, at: usize, names: impl Fn(&E, usize) -> Vec<(NodeId, String)>) -> RenamePlan {
	let mut plan = RenamePlan::default();
	for index in (at..entries.len()).rev() {
		plan.rename_entry(names(&entries[index], index), names(&entries[index], index + 1));
	}
	plan.rename_entry(dirty_names(names(inserted, at)), names(inserted, at));
	plan
}

/// Plans the removal of the entry at `at` of `entries`. The removed entry's nodes are vacated, the entries above it move down by one in ascending order.
pub fn plan_remove<E>(entries: &[E], at: usize, names: impl Fn(&E, usize) -> Vec<(NodeId, String)>) -> RenamePlan {
	let mut plan = RenamePlan::default();
	if let Some(removed) = entries.get(at) {
		plan.vacate(names(removed, at).into_iter().map(|(node_id, _)| node_id));
	}
	for index in at + 1..entries.len() {
		plan.rename_entry(names(&entries[index], index), names(&entries[index], index - 1));
	}
	plan
}

/// Plans swapping the entry at `from` with its neighbor at `to` as a rotation through a dirty name: the moved entry steps aside, the neighbor takes its names, then the moved entry takes the neighbor's.
pub fn plan_move<E>(entries: &[E], from: usize, to: usize, names: impl Fn(&E, usize) -> Vec<(NodeId, String)>) -> RenamePlan {
	let mut plan = RenamePlan::default();
	let (Some(moved), Some(neighbor)) = (entries.get(from), entries.get(to)) else {
		return plan;
	};
	plan.rename_entry(names(moved, from), dirty_names(names(moved, from)));
	plan.rename_entry(names(neighbor, to), names(neighbor, from));
	plan.rename_entry(dirty_names(names(moved, from)), names(moved, to));
	plan
}
