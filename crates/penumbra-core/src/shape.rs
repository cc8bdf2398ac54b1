use serde::{Deserialize, Serialize};

/// Primitive geometry evaluated by the kernel. Discriminants are the packed ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum ShapeKind {
    #[default]
    Sphere = 0,
    Cube = 1,
    Torus = 2,
}

/// How a primitive combines with the field accumulated from earlier records.
///
/// The derived `Ord` follows declaration order, which is also the packed
/// ordinal: None < Blend < Cut < Mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[repr(u32)]
pub enum Operation {
    #[default]
    None = 0,
    Blend = 1,
    Cut = 2,
    Mask = 3,
}

impl ShapeKind {
    pub fn ordinal(self) -> i32 {
        self as i32
    }
}

impl Operation {
    pub fn ordinal(self) -> i32 {
        self as i32
    }
}

/// Shape component attached to a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub kind: ShapeKind,
    pub operation: Operation,
    pub colour: [f32; 3],
    /// Nominally in [0, 1]. Not clamped.
    pub blend_strength: f32,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Sphere,
            operation: Operation::None,
            colour: [1.0, 1.0, 1.0],
            blend_strength: 0.0,
        }
    }
}

impl Shape {
    pub fn new(kind: ShapeKind, operation: Operation) -> Self {
        Self {
            kind,
            operation,
            ..Default::default()
        }
    }

    pub fn with_colour(mut self, colour: [f32; 3]) -> Self {
        self.colour = colour;
        self
    }

    pub fn with_blend_strength(mut self, blend_strength: f32) -> Self {
        self.blend_strength = blend_strength;
        self
    }
}
