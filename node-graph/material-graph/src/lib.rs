#[macro_use]
extern crate log;

pub mod backend;
pub mod document;
pub mod scene;
pub mod templates;

pub use backend::{GraphBackend, GraphError};
pub use document::value::{BlendMode, ImageId, Interpolation, MathOperation, ObjectId, TaggedValue};
pub use document::{DocumentNode, DocumentNodeMetadata, InputConnector, NodeId, NodeInput, NodeKind, NodeNetwork, OutputConnector};
pub use scene::{Scene, SceneError, SceneObjects};
pub use templates::{AssetLibrary, NodeTemplate, TemplateId, TemplateLibrary};
