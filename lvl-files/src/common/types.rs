use serde::{Deserialize, Serialize};

// Vectors are stored as plain arrays in the level description, so they round-trip through serde that way.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct C3Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<[f32; 3]> for C3Vector {
    fn from(value: [f32; 3]) -> Self {
        C3Vector {
            x: value[0],
            y: value[1],
            z: value[2],
        }
    }
}

impl From<C3Vector> for [f32; 3] {
    fn from(value: C3Vector) -> Self {
        [value.x, value.y, value.z]
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct C2Vector {
    pub x: f32,
    pub y: f32,
}

impl From<[f32; 2]> for C2Vector {
    fn from(value: [f32; 2]) -> Self {
        C2Vector {
            x: value[0],
            y: value[1],
        }
    }
}

impl From<C2Vector> for [f32; 2] {
    fn from(value: C2Vector) -> Self {
        [value.x, value.y]
    }
}

/// Component order is x, y, z, w.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct C4Quaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl C4Quaternion {
    pub const IDENTITY: C4Quaternion = C4Quaternion {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl Default for C4Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<[f32; 4]> for C4Quaternion {
    fn from(value: [f32; 4]) -> Self {
        C4Quaternion {
            x: value[0],
            y: value[1],
            z: value[2],
            w: value[3],
        }
    }
}

impl From<C4Quaternion> for [f32; 4] {
    fn from(value: C4Quaternion) -> Self {
        [value.x, value.y, value.z, value.w]
    }
}
