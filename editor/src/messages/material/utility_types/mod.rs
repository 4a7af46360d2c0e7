pub mod channel_schema;
pub mod mesh_maps;
pub mod naming;
pub mod stack;

pub use channel_schema::{ChannelDefinition, ChannelSchema, ChannelValue, DataType};
pub use mesh_maps::MeshMaps;
pub use stack::*;
