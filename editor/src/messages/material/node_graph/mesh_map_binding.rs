use super::modify_stack_context::ModifyStackContext;
use crate::error::StackError;
use crate::messages::material::utility_types::mesh_maps::MeshMaps;
use crate::messages::material::utility_types::stack::{LayerStack, MaskKind, MeshMapType};

use material_graph::{ImageId, NodeId, NodeKind};

/// The texture nodes of a stack reading a mesh map.
fn mesh_map_readers(stack: &LayerStack) -> Vec<(NodeId, MeshMapType)> {
	let masks = stack.layers.iter().flat_map(|layer| layer.masks.masks.iter());
	masks
		.flat_map(|mask| match mask.kind {
			MaskKind::MeshMapDriven(map) => mask.nodes.source.values.iter().map(|value| (*value, map)).collect(),
			MaskKind::EdgeWear => mask.nodes.mesh_map.map(|mesh_map| (mesh_map, MeshMapType::Curvature)).into_iter().collect(),
			_ => Vec::new(),
		})
		.collect()
}

fn bind_image(context: &mut ModifyStackContext, node_id: NodeId, image: ImageId) -> Result<bool, StackError> {
	let NodeKind::Texture { interpolation, .. } = context.node(node_id)?.kind else {
		warn!("Node {node_id} reads a mesh map but samples no image");
		return Ok(false);
	};
	context.network.set_node_kind(node_id, NodeKind::Texture { image: Some(image), interpolation })?;
	Ok(true)
}

/// Binds the baked mesh maps into every node of the stack reading one, returning how many nodes were updated.
pub fn apply_mesh_maps(context: &mut ModifyStackContext, stack: &LayerStack, maps: &MeshMaps) -> Result<usize, StackError> {
	let mut updated = 0;
	for (node_id, map) in mesh_map_readers(stack) {
		let Some(image) = maps.get(map) else { continue };
		if bind_image(context, node_id, image)? {
			updated += 1;
		}
	}
	debug!("Bound mesh maps into {updated} nodes");
	Ok(updated)
}

#[cfg(test)]
mod test {
	use crate::messages::material::utility_types::stack::{LayerKind, MaskKind, MeshMapType};
	use crate::messages::prelude::*;
	use crate::test_utils::StackTestUtils;
	use material_graph::{GraphBackend, ImageId, NodeKind};
	use pretty_assertions::assert_eq;

	#[test]
	fn baked_maps_reach_every_reader() {
		let mut utils = StackTestUtils::create();
		utils.handle_ok(MaterialMessage::AddLayer {
			kind: LayerKind::Material,
			insert_index: None,
		});
		for kind in [MaskKind::EdgeWear, MaskKind::MeshMapDriven(MeshMapType::Curvature), MaskKind::MeshMapDriven(MeshMapType::Thickness), MaskKind::Grunge] {
			utils.handle_ok(MaterialMessage::AddMask { layer: 0, kind, insert_index: None });
		}

		let maps = [(MeshMapType::Curvature, ImageId(3))].into_iter().collect();
		let responses = utils.handle_ok(MaterialMessage::ApplyMeshMaps { maps });
		assert_eq!(responses, vec![StackResponse::MeshMapsApplied { nodes: 2 }]);

		let image = |utils: &StackTestUtils, name: &str| match utils.network.node(utils.node_named(name)).unwrap().kind {
			NodeKind::Texture { image, .. } => image,
			_ => panic!("{name} should sample an image"),
		};
		assert_eq!(image(&utils, "MASK_MESH_MAP_0_0"), Some(ImageId(3)));
		assert_eq!(image(&utils, "MASK_VALUE_0_1"), Some(ImageId(3)));
		assert_eq!(image(&utils, "MASK_VALUE_0_2"), None);
		assert_eq!(image(&utils, "MASK_VALUE_0_3"), None);

		// Applying more maps keeps the ones baked earlier
		let maps = [(MeshMapType::Thickness, ImageId(4))].into_iter().collect();
		let responses = utils.handle_ok(MaterialMessage::ApplyMeshMaps { maps });
		assert_eq!(responses, vec![StackResponse::MeshMapsApplied { nodes: 3 }]);
		assert_eq!(image(&utils, "MASK_VALUE_0_2"), Some(ImageId(4)));
		assert_eq!(utils.editor.material().mesh_maps.get(MeshMapType::Curvature), Some(ImageId(3)));
	}
}
