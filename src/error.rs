use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Model {0} could not be found")]
    ModelNotFound(String),

    #[error("Bone {bone} references the unknown parent {parent}")]
    UnresolvedParent { bone: String, parent: String },

    #[error("Bone {0} is declared more than once")]
    DuplicateBone(String),

    #[error("The parent chain of bone {0} forms a cycle")]
    CyclicHierarchy(String),

    #[error("A segment is bound to bone {0}, which is not part of the skeleton")]
    UnknownSegmentBone(String),

    #[error("Segment {segment} references vertex {index}, but only has {vertex_count} vertices")]
    IndexOutOfRange {
        segment: usize,
        index: u32,
        vertex_count: usize,
    },

    #[error("{pretransformed} out of {segments} segments are pretransformed, expected none or all")]
    HeterogeneousPretransformation { pretransformed: usize, segments: usize },

    #[error("The collision mesh is invalid: {0}")]
    InvalidCollisionMesh(String),

    #[error("Texture {0} could not be loaded")]
    MissingTexture(String),
}

/// The part of a model an [`ImportIssue`] is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportUnit {
    Bone(String),
    SegmentGroup(String),
    SkinWeights,
    Collision,
    Texture(String),
}

impl Display for ImportUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportUnit::Bone(name) => write!(f, "bone {name}"),
            ImportUnit::SegmentGroup(name) if name.is_empty() => write!(f, "root segment group"),
            ImportUnit::SegmentGroup(name) => write!(f, "segment group of {name}"),
            ImportUnit::SkinWeights => write!(f, "skin weights"),
            ImportUnit::Collision => write!(f, "collision mesh"),
            ImportUnit::Texture(name) => write!(f, "texture {name}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The unit has been left out of the result.
    Skipped,
    /// The unit is part of the result, with reduced fidelity.
    Degraded,
}

/// A non-fatal problem encountered while importing a model. Fatal problems abort the model with an
/// [`ImportError`] instead.
#[derive(Debug)]
pub struct ImportIssue {
    pub unit: ImportUnit,
    pub disposition: Disposition,
    pub error: ImportError,
}

impl ImportIssue {
    pub fn skipped(unit: ImportUnit, error: ImportError) -> Self {
        Self {
            unit,
            disposition: Disposition::Skipped,
            error,
        }
    }

    pub fn degraded(unit: ImportUnit, error: ImportError) -> Self {
        Self {
            unit,
            disposition: Disposition::Degraded,
            error,
        }
    }
}

impl Display for ImportIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:?}): {}", self.unit, self.disposition, self.error)
    }
}
