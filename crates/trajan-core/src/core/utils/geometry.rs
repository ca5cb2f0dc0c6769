use nalgebra::{Point3, Vector3};

pub fn calculate_rmsd(coords1: &[Point3<f64>], coords2: &[Point3<f64>]) -> Option<f64> {
    if coords1.len() != coords2.len() || coords1.is_empty() {
        return None;
    }
    let n = coords1.len() as f64;
    let squared_dist_sum: f64 = coords1
        .iter()
        .zip(coords2.iter())
        .map(|(p1, p2)| (p1 - p2).norm_squared())
        .sum();
    Some((squared_dist_sum / n).sqrt())
}

/// Weighted centroid of a point set. Returns `None` for empty input or a
/// non-positive total weight.
pub fn weighted_center(coords: &[Point3<f64>], weights: &[f64]) -> Option<Point3<f64>> {
    if coords.len() != weights.len() || coords.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return None;
    }
    let sum = coords
        .iter()
        .zip(weights)
        .fold(Vector3::zeros(), |acc, (p, &w)| acc + p.coords * w);
    Some(Point3::from(sum / total))
}

/// Weighted radius of gyration about the weighted center.
pub fn radius_of_gyration(coords: &[Point3<f64>], weights: &[f64]) -> Option<f64> {
    let center = weighted_center(coords, weights)?;
    let total: f64 = weights.iter().sum();
    let moment: f64 = coords
        .iter()
        .zip(weights)
        .map(|(p, &w)| w * (p - center).norm_squared())
        .sum();
    Some((moment / total).sqrt())
}
