use crate::constants::THREAD_GROUP_SIZE;

/// Number of compute workgroups launched for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchGrid {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl DispatchGrid {
    /// Enough 8x8 workgroups to cover every pixel of a `width x height` target.
    pub fn for_target(width: u32, height: u32) -> Self {
        Self {
            x: width.div_ceil(THREAD_GROUP_SIZE),
            y: height.div_ceil(THREAD_GROUP_SIZE),
            z: 1,
        }
    }

    pub fn workgroups(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }

    pub fn to_array(self) -> [u32; 3] {
        [self.x, self.y, self.z]
    }
}
