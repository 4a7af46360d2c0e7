use crate::consts::DEFAULT_TRIPLANAR_BLENDING;
use crate::messages::material::utility_types::channel_schema::DataType;
use crate::messages::material::utility_types::stack::{MeshMapType, ProjectionMode};

use glam::Vec4;
use material_graph::{NodeTemplate, TaggedValue, TemplateLibrary};
use once_cell::sync::Lazy;
use strum::IntoEnumIterator;

pub const UV_PROJECTION: &str = "UV Projection";
pub const TRIPLANAR_PROJECTION: &str = "Triplanar Projection";
pub const DECAL_PROJECTION: &str = "Decal Projection";
pub const TRIPLANAR_BLEND: &str = "Triplanar Blend";
pub const TRIPLANAR_NORMAL_BLEND: &str = "Triplanar Normal Blend";
pub const NORMAL_ROTATION_FIX: &str = "Normal Rotation Fix";
pub const SCALAR_FILTER: &str = "Scalar Filter";
pub const COLOR_FILTER: &str = "Color Filter";
pub const NORMAL_FILTER: &str = "Normal Filter";
pub const MASK_FILTER: &str = "Mask Filter";
pub const LINEAR_GRADIENT: &str = "Linear Gradient";
pub const EDGE_WEAR: &str = "Edge Wear";

// Socket names
pub const VECTOR: &str = "Vector";
pub const ROTATION: &str = "Rotation";
pub const BLUR_NOISE: &str = "Blur Noise";
pub const CLIP: &str = "Clip";
pub const OBJECT: &str = "Object";
pub const AXIS_MASK: &str = "Axis Mask";
pub const SIGNED_GEOMETRY_NORMAL: &str = "Signed Geometry Normal";
pub const SHARPNESS: &str = "Sharpness";
pub const NORMAL: &str = "Normal";
pub const VALUE: &str = "Value";
pub const COLOR: &str = "Color";
pub const CURVATURE: &str = "Curvature";
/// The projection outputs feeding the three triplanar samples, in sample order.
pub const TRIPLANAR_AXES: [&str; 3] = ["X", "Y", "Z"];

pub fn projection_template(projection: ProjectionMode) -> &'static str {
	match projection {
		ProjectionMode::UV => UV_PROJECTION,
		ProjectionMode::Triplanar => TRIPLANAR_PROJECTION,
		ProjectionMode::Decal => DECAL_PROJECTION,
	}
}

/// The projection mode a projection template implements, used when reading a stack back from the graph.
pub fn projection_mode_of(template_name: &str) -> Option<ProjectionMode> {
	ProjectionMode::iter().find(|mode| projection_template(*mode) == template_name)
}

pub fn filter_template(data_type: DataType) -> &'static str {
	match data_type {
		DataType::Scalar => SCALAR_FILTER,
		DataType::Color => COLOR_FILTER,
		DataType::Vector => NORMAL_FILTER,
	}
}

pub fn triplanar_blend_template(normal: bool) -> &'static str {
	if normal { TRIPLANAR_NORMAL_BLEND } else { TRIPLANAR_BLEND }
}

pub fn mesh_map_bake_template(map: MeshMapType) -> String {
	format!("{map} Bake")
}

pub fn triplanar_color_input(sample: usize) -> String {
	format!("{} {COLOR}", TRIPLANAR_AXES[sample])
}

pub fn triplanar_alpha_input(sample: usize) -> String {
	format!("{} Alpha", TRIPLANAR_AXES[sample])
}

static TEMPLATE_DEFINITIONS: Lazy<Vec<NodeTemplate>> = Lazy::new(static_templates);

fn projection_inputs(template: NodeTemplate) -> NodeTemplate {
	template
		.with_input("Scale", TaggedValue::F32(1.))
		.with_input(ROTATION, TaggedValue::F32(0.))
		.with_input("Offset", TaggedValue::Color(Vec4::ZERO))
}

fn triplanar_blend(name: &str) -> NodeTemplate {
	let mut template = NodeTemplate::new(name);
	for sample in 0..TRIPLANAR_AXES.len() {
		template = template.with_input(triplanar_color_input(sample), TaggedValue::None);
	}
	for sample in 0..TRIPLANAR_AXES.len() {
		template = template.with_input(triplanar_alpha_input(sample), TaggedValue::F32(1.));
	}
	template
		.with_input(AXIS_MASK, TaggedValue::None)
		.with_input(ROTATION, TaggedValue::F32(0.))
		.with_input(SHARPNESS, TaggedValue::F32(DEFAULT_TRIPLANAR_BLENDING))
		.with_output(COLOR)
		.with_output("Alpha")
}

fn filter(name: &str, value: TaggedValue) -> NodeTemplate {
	NodeTemplate::new(name).with_input(VALUE, value).with_input("Strength", TaggedValue::F32(1.)).with_output(VALUE)
}

fn static_templates() -> Vec<NodeTemplate> {
	let mut templates = vec![
		projection_inputs(NodeTemplate::new(UV_PROJECTION)).with_output(VECTOR).with_output(ROTATION).with_output(BLUR_NOISE),
		projection_inputs(NodeTemplate::new(TRIPLANAR_PROJECTION))
			.with_output(TRIPLANAR_AXES[0])
			.with_output(TRIPLANAR_AXES[1])
			.with_output(TRIPLANAR_AXES[2])
			.with_output(AXIS_MASK)
			.with_output(ROTATION)
			.with_output(SIGNED_GEOMETRY_NORMAL)
			.with_output(BLUR_NOISE),
		NodeTemplate::new(DECAL_PROJECTION)
			.with_input(OBJECT, TaggedValue::Object(None))
			.with_input("Scale", TaggedValue::F32(1.))
			.with_output(VECTOR)
			.with_output(ROTATION)
			.with_output(CLIP)
			.with_output(BLUR_NOISE),
		triplanar_blend(TRIPLANAR_BLEND),
		// The signed geometry normal corrects the seams between the blended normal samples
		triplanar_blend(TRIPLANAR_NORMAL_BLEND).with_input(SIGNED_GEOMETRY_NORMAL, TaggedValue::None),
		NodeTemplate::new(NORMAL_ROTATION_FIX)
			.with_input(NORMAL, TaggedValue::Color(Vec4::new(0.5, 0.5, 1., 1.)))
			.with_input(ROTATION, TaggedValue::F32(0.))
			.with_output(NORMAL),
		filter(SCALAR_FILTER, TaggedValue::F32(0.)),
		filter(COLOR_FILTER, TaggedValue::Color(Vec4::ZERO)),
		filter(NORMAL_FILTER, TaggedValue::Color(Vec4::new(0.5, 0.5, 1., 1.))),
		NodeTemplate::new(MASK_FILTER)
			.with_input(VALUE, TaggedValue::F32(1.))
			.with_input(BLUR_NOISE, TaggedValue::None)
			.with_input("Blur", TaggedValue::F32(0.))
			.with_input("Contrast", TaggedValue::F32(0.))
			.with_output(VALUE),
		NodeTemplate::new(LINEAR_GRADIENT).with_input(VECTOR, TaggedValue::None).with_output(COLOR),
		NodeTemplate::new(EDGE_WEAR)
			.with_input(VECTOR, TaggedValue::None)
			.with_input(CURVATURE, TaggedValue::F32(0.5))
			.with_input("Amount", TaggedValue::F32(0.5))
			.with_output(COLOR),
	];
	templates.extend(MeshMapType::iter().map(|map| NodeTemplate::new(mesh_map_bake_template(map)).with_output(COLOR)));
	templates
}

pub fn resolve_template_definition(name: &str) -> Option<&'static NodeTemplate> {
	TEMPLATE_DEFINITIONS.iter().find(|definition| definition.name == name)
}

/// An asset library holding every built-in template.
pub fn default_asset_library() -> TemplateLibrary {
	TemplateLibrary::new(TEMPLATE_DEFINITIONS.iter().cloned())
}

#[cfg(test)]
mod test {
	use super::*;
	use material_graph::AssetLibrary;

	#[test]
	fn every_referenced_template_is_defined() {
		let library = default_asset_library();
		for mode in ProjectionMode::iter() {
			assert!(library.contains(projection_template(mode)));
			assert_eq!(projection_mode_of(projection_template(mode)), Some(mode));
		}
		for data_type in DataType::iter() {
			assert!(library.contains(filter_template(data_type)));
		}
		for map in MeshMapType::iter() {
			assert!(library.contains(&mesh_map_bake_template(map)));
		}
		assert!(library.contains(NORMAL_ROTATION_FIX));
	}

	#[test]
	fn triplanar_sockets() {
		let blend = resolve_template_definition(TRIPLANAR_NORMAL_BLEND).unwrap();
		assert_eq!(blend.input_index(&triplanar_color_input(2)), Some(2));
		assert_eq!(blend.input_index(&triplanar_alpha_input(0)), Some(3));
		assert_eq!(blend.input_index(SIGNED_GEOMETRY_NORMAL), Some(9));
		let projection = resolve_template_definition(TRIPLANAR_PROJECTION).unwrap();
		assert_eq!(projection.output_index(TRIPLANAR_AXES[1]), Some(1));
	}
}
