use crate::constants::{BLEND_STRENGTH_SCALE, SHAPE_RECORD_BYTES};
use crate::flatten::FlatShape;

/// GPU-uploadable shape record (52 bytes). Must match `Shape` in
/// [`ShapeRecord::WGSL_DECLARATION`], which is what the kernel sees.
///
/// Every field is 4-byte aligned, so the array stride is exactly the struct
/// size with no trailing padding.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ShapeRecord {
    pub position: [f32; 3],
    pub scale: [f32; 3],
    pub colour: [f32; 3],
    pub shape_kind: i32,
    pub operation: i32,
    /// Already multiplied by `BLEND_STRENGTH_SCALE`.
    pub blend_strength: f32,
    pub child_count: i32,
}

const _: () = assert!(std::mem::size_of::<ShapeRecord>() == SHAPE_RECORD_BYTES as usize);

impl ShapeRecord {
    /// WGSL mirror of this struct. Scalar arrays keep the stride at 52 bytes
    /// (a `vec3<f32>` would be padded to 16).
    pub const WGSL_DECLARATION: &'static str = "struct Shape {
    position: array<f32, 3>,
    scale: array<f32, 3>,
    colour: array<f32, 3>,
    shapeType: i32,
    operation: i32,
    blendStrength: f32,
    numChildren: i32,
}
";
}

impl From<&FlatShape> for ShapeRecord {
    fn from(shape: &FlatShape) -> Self {
        Self {
            position: shape.position.to_array(),
            scale: shape.scale.to_array(),
            colour: shape.colour.to_array(),
            shape_kind: shape.kind.ordinal(),
            operation: shape.operation.ordinal(),
            blend_strength: shape.blend_strength * BLEND_STRENGTH_SCALE,
            child_count: shape.child_count as i32,
        }
    }
}

/// Contiguous record buffer for one frame, in flattened order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackedShapes {
    records: Vec<ShapeRecord>,
}

impl PackedShapes {
    /// Pack flattened shapes, preserving order. Values are not validated:
    /// NaN positions and negative scales pass straight through.
    pub fn pack(shapes: &[FlatShape]) -> Self {
        Self {
            records: shapes.iter().map(ShapeRecord::from).collect(),
        }
    }

    pub fn records(&self) -> &[ShapeRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Shape count handed to the kernel alongside the buffer.
    pub fn shape_count(&self) -> u32 {
        self.records.len() as u32
    }

    /// Exact byte length of the packed data: `shape_count * 52`.
    pub fn byte_len(&self) -> u64 {
        self.records.len() as u64 * SHAPE_RECORD_BYTES
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.records)
    }
}
