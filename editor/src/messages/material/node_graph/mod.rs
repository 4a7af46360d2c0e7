//! Everything that edits the node graph of a material on behalf of its layer stack.

mod channel_router;
mod layer_builder;
mod layer_operations;
mod link;
mod mask_builder;
mod mask_operations;
mod projection;
mod reindex;
mod sub_graph;

pub mod isolation;
pub mod mesh_map_binding;
pub mod modify_stack_context;
pub mod node_definitions;
pub mod refresh;
pub mod validation;

pub use channel_router::{read_output_channel, validate_output_channel};
pub use layer_operations::ensure_root;
pub use link::{StackLinks, link_entries, link_layers, link_masks};
pub use reindex::{Rename, RenamePlan, plan_insert, plan_move, plan_remove};
