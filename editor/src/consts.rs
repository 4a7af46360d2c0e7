use glam::IVec2;

// NAMING
/// Appended to the names of nodes that are being built or moved, so they can never collide with a live positional name.
pub const DIRTY_MARKER: char = '~';
pub const MATERIAL_SHADER_NAME: &str = "MATERIAL_SHADER";
pub const MATERIAL_OUTPUT_NAME: &str = "MATERIAL_OUTPUT";
pub const PREVIEW_EMISSION_NAME: &str = "PREVIEW_EMISSION";
pub const MESH_MAP_BAKE_NAME: &str = "MESH_MAP_BAKE";

// PROJECTION
pub const TRIPLANAR_SAMPLES: usize = 3;
pub const DEFAULT_TRIPLANAR_BLENDING: f32 = 0.5;

// LAYOUT
pub const DEFAULT_NODE_SPACING: IVec2 = IVec2::new(300, 220);
/// Rows reserved below every layer for its masks before the next layer starts.
pub const MASK_ROWS_PER_LAYER: i32 = 8;
