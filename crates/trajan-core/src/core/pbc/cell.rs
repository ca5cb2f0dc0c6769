use nalgebra::{Point3, Vector3};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Which dimensions of the simulation box are periodic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PbcType {
    /// Periodic in all three dimensions.
    #[default]
    Xyz,
    /// Periodic in x and y only (slab systems).
    Xy,
    /// No periodicity.
    None,
}

#[derive(Debug, Error)]
#[error("Invalid PBC type string")]
pub struct ParsePbcTypeError;

impl FromStr for PbcType {
    type Err = ParsePbcTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xyz" => Ok(PbcType::Xyz),
            "xy" => Ok(PbcType::Xy),
            "no" | "none" => Ok(PbcType::None),
            _ => Err(ParsePbcTypeError),
        }
    }
}

impl fmt::Display for PbcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                PbcType::Xyz => "xyz",
                PbcType::Xy => "xy",
                PbcType::None => "none",
            }
        )
    }
}

/// The simulation box as three box vectors in nm.
///
/// Boxes follow the lower-triangular convention: `a` lies along x, `b` lies in the xy
/// plane, and every vector has a positive diagonal component.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationBox {
    vectors: [Vector3<f64>; 3],
}

impl SimulationBox {
    pub fn from_vectors(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Self {
        Self { vectors: [a, b, c] }
    }

    pub fn rectangular(x: f64, y: f64, z: f64) -> Self {
        Self::from_vectors(
            Vector3::new(x, 0.0, 0.0),
            Vector3::new(0.0, y, 0.0),
            Vector3::new(0.0, 0.0, z),
        )
    }

    /// Builds a box from edge lengths and the angles between them, in degrees
    /// (`alpha` between b and c, `beta` between a and c, `gamma` between a and b).
    pub fn from_lengths_and_angles(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Self {
        let (cos_alpha, cos_beta) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_gamma, cos_gamma) = gamma.to_radians().sin_cos();

        let cx = c * cos_beta;
        let cy = c * (cos_alpha - cos_beta * cos_gamma) / sin_gamma;
        let cz = (c * c - cx * cx - cy * cy).max(0.0).sqrt();
        Self::from_vectors(
            Vector3::new(a, 0.0, 0.0),
            Vector3::new(b * cos_gamma, b * sin_gamma, 0.0),
            Vector3::new(cx, cy, cz),
        )
    }

    pub fn vectors(&self) -> &[Vector3<f64>; 3] {
        &self.vectors
    }

    pub fn volume(&self) -> f64 {
        let [a, b, c] = &self.vectors;
        a.dot(&b.cross(c)).abs()
    }

    /// A box with a non-positive diagonal element cannot be used for periodic images.
    pub fn is_degenerate(&self) -> bool {
        (0..3).any(|d| self.vectors[d][d] <= 0.0)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        let [a, b, c] = self.vectors;
        Self::from_vectors(a * factor, b * factor, c * factor)
    }
}

/// Periodic context for one frame: the box plus the periodic dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pbc {
    pbc_type: PbcType,
    simulation_box: SimulationBox,
}

impl Pbc {
    /// Returns `None` when the combination cannot produce periodic images.
    pub fn new(pbc_type: PbcType, simulation_box: SimulationBox) -> Option<Self> {
        if pbc_type == PbcType::None || simulation_box.is_degenerate() {
            return None;
        }
        Some(Self {
            pbc_type,
            simulation_box,
        })
    }

    pub fn pbc_type(&self) -> PbcType {
        self.pbc_type
    }

    pub fn simulation_box(&self) -> &SimulationBox {
        &self.simulation_box
    }

    /// Reduces a displacement to its shortest periodic image.
    ///
    /// Box vectors are applied from c down to a, so that each step only touches the
    /// components not yet reduced.
    pub fn minimum_image(&self, mut dx: Vector3<f64>) -> Vector3<f64> {
        let periodic_dims = match self.pbc_type {
            PbcType::Xyz => 3,
            PbcType::Xy => 2,
            PbcType::None => 0,
        };
        for d in (0..periodic_dims).rev() {
            let vector = self.simulation_box.vectors[d];
            let shift = (dx[d] / vector[d]).round();
            if shift != 0.0 {
                dx -= vector * shift;
            }
        }
        dx
    }

    /// The minimum-image displacement from `b` to `a`.
    pub fn dx(&self, a: &Point3<f64>, b: &Point3<f64>) -> Vector3<f64> {
        self.minimum_image(a - b)
    }
}
