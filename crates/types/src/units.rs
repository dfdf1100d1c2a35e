//! Length conversions. Everything downstream of the builder works in PDF points.

pub const POINTS_PER_INCH: f32 = 72.0;
pub const POINTS_PER_CM: f32 = POINTS_PER_INCH / 2.54;

pub fn cm(value: f32) -> f32 {
    value * POINTS_PER_CM
}

pub fn mm(value: f32) -> f32 {
    value * POINTS_PER_CM / 10.0
}

pub fn inch(value: f32) -> f32 {
    value * POINTS_PER_INCH
}
