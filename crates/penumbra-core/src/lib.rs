pub mod constants;
pub mod error;
pub mod flatten;
pub mod math;
pub mod record;
pub mod scene;
pub mod settings;
pub mod shape;
pub mod view;

pub use error::PenumbraError;
pub use flatten::{flatten_scene, FlatShape};
pub use math::DispatchGrid;
pub use record::{PackedShapes, ShapeRecord};
pub use scene::{NodeId, PrimitiveRegistry, SceneGraph, Transform};
pub use settings::{PassEvent, PassSettings};
pub use shape::{Operation, Shape, ShapeKind};
pub use view::{CameraView, LightSource};
