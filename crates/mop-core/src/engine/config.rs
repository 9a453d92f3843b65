use crate::core::models::ligand::LinkerPair;
use crate::core::polyhedra::catalog::PolyhedronKind;
use nalgebra::Vector3;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_AUTO_BOX_PADDING: f64 = 10.0;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

/// Which polyhedron feature each ligand copy is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlacementMode {
    /// One 2-anchor copy per edge.
    #[default]
    Edge,
    /// One copy per face, anchors on the face vertices.
    Face,
    /// One copy per face, anchors on the midpoints of the face's edges.
    Bent,
    /// A single untransformed copy.
    Single,
}

impl FromStr for PlacementMode {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "edge" => Ok(Self::Edge),
            "face" => Ok(Self::Face),
            "bent" => Ok(Self::Bent),
            "single" => Ok(Self::Single),
            _ => Err(ConfigError::InvalidParameter {
                parameter: "mode",
                reason: format!("unknown placement mode '{}'", s),
            }),
        }
    }
}

impl fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Edge => "edge",
            Self::Face => "face",
            Self::Bent => "bent",
            Self::Single => "single",
        })
    }
}

/// How the physical scale of the solid is derived from the ligand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalingConvention {
    /// Shortest anchor separation over shortest target separation.
    #[default]
    EdgeLength,
    /// Mean anchor-to-centroid distance over mean target-to-centroid distance.
    Circumradius,
}

impl FromStr for ScalingConvention {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "edge-length" | "edge" => Ok(Self::EdgeLength),
            "circumradius" | "radius" => Ok(Self::Circumradius),
            _ => Err(ConfigError::InvalidParameter {
                parameter: "scaling",
                reason: format!("unknown scaling convention '{}'", s),
            }),
        }
    }
}

/// Side of a face the anchor-plane normal of a face-placed copy points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FaceOrientation {
    #[default]
    Outward,
    Inward,
}

impl FromStr for FaceOrientation {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outward" | "out" => Ok(Self::Outward),
            "inward" | "in" => Ok(Self::Inward),
            _ => Err(ConfigError::InvalidParameter {
                parameter: "orientation",
                reason: format!("unknown face orientation '{}'", s),
            }),
        }
    }
}

/// Where the anchors of the ligand come from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AnchorSelection {
    /// Derived from force field types and bonds.
    #[default]
    Auto,
    /// Given directly by atom index.
    Explicit {
        anchors: Vec<usize>,
        linker: Option<LinkerPair>,
    },
    /// Looked up by ligand name in a registry file; falls back to discovery when absent.
    Registry { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoxSpec {
    Periodic { lengths: Vector3<f64> },
    AutoPeriodic { padding: f64 },
    Open,
}

impl BoxSpec {
    pub fn periodic(lengths: [f64; 3]) -> Self {
        BoxSpec::Periodic {
            lengths: Vector3::from(lengths),
        }
    }
}

impl Default for BoxSpec {
    fn default() -> Self {
        BoxSpec::AutoPeriodic {
            padding: DEFAULT_AUTO_BOX_PADDING,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyConfig {
    pub shape: PolyhedronKind,
    pub mode: PlacementMode,
    pub scaling: ScalingConvention,
    pub orientation: FaceOrientation,
    pub anchors: AnchorSelection,
    pub box_spec: BoxSpec,
    /// When set, a copy whose worst anchor misses its target by more than this fails the run.
    pub max_anchor_deviation: Option<f64>,
}

#[derive(Default)]
pub struct AssemblyConfigBuilder {
    shape: Option<PolyhedronKind>,
    mode: Option<PlacementMode>,
    scaling: Option<ScalingConvention>,
    orientation: Option<FaceOrientation>,
    anchors: Option<AnchorSelection>,
    box_spec: Option<BoxSpec>,
    max_anchor_deviation: Option<f64>,
}

impl AssemblyConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(mut self, shape: PolyhedronKind) -> Self {
        self.shape = Some(shape);
        self
    }
    pub fn mode(mut self, mode: PlacementMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn scaling(mut self, scaling: ScalingConvention) -> Self {
        self.scaling = Some(scaling);
        self
    }
    pub fn orientation(mut self, orientation: FaceOrientation) -> Self {
        self.orientation = Some(orientation);
        self
    }
    pub fn anchors(mut self, anchors: AnchorSelection) -> Self {
        self.anchors = Some(anchors);
        self
    }
    pub fn box_spec(mut self, box_spec: BoxSpec) -> Self {
        self.box_spec = Some(box_spec);
        self
    }
    pub fn max_anchor_deviation(mut self, deviation: f64) -> Self {
        self.max_anchor_deviation = Some(deviation);
        self
    }

    pub fn build(self) -> Result<AssemblyConfig, ConfigError> {
        let box_spec = self.box_spec.unwrap_or_default();
        match &box_spec {
            BoxSpec::Periodic { lengths } if lengths.iter().any(|l| !(l.is_finite() && *l > 0.0)) => {
                return Err(ConfigError::InvalidParameter {
                    parameter: "box_spec",
                    reason: "box lengths must be positive".to_string(),
                });
            }
            BoxSpec::AutoPeriodic { padding } if !(padding.is_finite() && *padding >= 0.0) => {
                return Err(ConfigError::InvalidParameter {
                    parameter: "box_spec",
                    reason: "padding must be non-negative".to_string(),
                });
            }
            _ => {}
        }
        if let Some(deviation) = self.max_anchor_deviation {
            if !(deviation.is_finite() && deviation >= 0.0) {
                return Err(ConfigError::InvalidParameter {
                    parameter: "max_anchor_deviation",
                    reason: "must be a non-negative distance".to_string(),
                });
            }
        }

        Ok(AssemblyConfig {
            shape: self.shape.ok_or(ConfigError::MissingParameter("shape"))?,
            mode: self.mode.unwrap_or_default(),
            scaling: self.scaling.unwrap_or_default(),
            orientation: self.orientation.unwrap_or_default(),
            anchors: self.anchors.unwrap_or_default(),
            box_spec,
            max_anchor_deviation: self.max_anchor_deviation,
        })
    }
}
