//! Serde adapters for the scene JSON layout.
//!
//! Vectors arrive as plain number arrays. Positions and directions may
//! carry a fourth homogeneous component, which is dropped; colors without
//! an alpha component are opaque.

use glint_math::{Color, DMat4, DVec2, DVec3};
use serde::de::Error;
use serde::{Deserialize, Deserializer};

fn expect_components<E: Error>(values: &[f64], wanted: usize) -> Result<(), E> {
    if values.len() < wanted {
        return Err(E::custom(format!(
            "expected at least {} components, got {}",
            wanted,
            values.len()
        )));
    }
    Ok(())
}

fn to_vec3<E: Error>(values: &[f64]) -> Result<DVec3, E> {
    expect_components::<E>(values, 3)?;
    Ok(DVec3::new(values[0], values[1], values[2]))
}

fn to_vec2<E: Error>(values: &[f64]) -> Result<DVec2, E> {
    expect_components::<E>(values, 2)?;
    Ok(DVec2::new(values[0], values[1]))
}

pub fn vec3<'de, D: Deserializer<'de>>(d: D) -> Result<DVec3, D::Error> {
    let values = Vec::<f64>::deserialize(d)?;
    to_vec3(&values)
}

pub fn vec3_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<DVec3>, D::Error> {
    let rows = Vec::<Vec<f64>>::deserialize(d)?;
    rows.iter().map(|row| to_vec3(row)).collect()
}

pub fn vec2_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<DVec2>, D::Error> {
    let rows = Vec::<Vec<f64>>::deserialize(d)?;
    rows.iter().map(|row| to_vec2(row)).collect()
}

pub fn color<'de, D: Deserializer<'de>>(d: D) -> Result<Color, D::Error> {
    let values = Vec::<f64>::deserialize(d)?;
    expect_components::<D::Error>(&values, 3)?;
    let alpha = values.get(3).copied().unwrap_or(1.0);
    Ok(Color::new(values[0], values[1], values[2], alpha))
}

/// Matrices are written row by row with translation in the last row
/// (row-vector convention). Reading the rows as glam columns transposes
/// them into glam's column-vector convention.
pub fn matrix<'de, D: Deserializer<'de>>(d: D) -> Result<DMat4, D::Error> {
    let rows = <[[f64; 4]; 4]>::deserialize(d)?;
    Ok(DMat4::from_cols_array_2d(&rows))
}
