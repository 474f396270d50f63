use std::fmt;

use super::model::EmissionLine;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Wavelengths (Å) below this are tabulated in vacuum, the rest in air.
pub const VACUUM_THRESHOLD: f64 = 2000.0;

/// Fixed iteration budget for the air → vacuum inverse.
///
/// Deliberately not a convergence test: the same count everywhere keeps the
/// converted values bit-reproducible.
pub const AIR_TO_VACUUM_ITERATIONS: usize = 10;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A wavelength that cannot be converted between vacuum and air.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("wavelength must be finite, got {0}")]
    NotFinite(f64),

    #[error("wavelength must be positive, got {0} Å")]
    NotPositive(f64),
}

/// Reject wavelengths no conversion is defined for.
pub fn validate_wavelength(lambda: f64) -> Result<f64, ConversionError> {
    if !lambda.is_finite() {
        return Err(ConversionError::NotFinite(lambda));
    }
    if lambda <= 0.0 {
        return Err(ConversionError::NotPositive(lambda));
    }
    Ok(lambda)
}

// ---------------------------------------------------------------------------
// Medium – which unit system a wavelength is expressed in
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Medium {
    Vacuum,
    Air,
}

impl Medium {
    /// Map the viewer's "show vacuum" toggle onto a medium.
    pub fn from_show_vacuum(show_vacuum: bool) -> Self {
        if show_vacuum {
            Medium::Vacuum
        } else {
            Medium::Air
        }
    }

    /// The medium a tabulated wavelength of this magnitude is given in.
    pub fn of_tabulated(wavelength: f64) -> Self {
        Self::from_show_vacuum(wavelength < VACUUM_THRESHOLD)
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Medium::Vacuum => "vac",
            Medium::Air => "air",
        }
    }
}

impl fmt::Display for Medium {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Medium::Vacuum => write!(f, "vacuum"),
            Medium::Air => write!(f, "air"),
        }
    }
}

// ---------------------------------------------------------------------------
// Refractive index and conversions
// ---------------------------------------------------------------------------

/// Refractive index of standard air at vacuum wavelength `lambda_vac` (Å).
fn refractive_index(lambda_vac: f64) -> f64 {
    let l2 = lambda_vac * lambda_vac;
    1.0 + 2.735182e-4 + 131.4182 / l2 + 2.76249e8 / (l2 * l2)
}

/// Convert a vacuum wavelength (Å) to its air wavelength.
pub fn vacuum_to_air(lambda_vac: f64) -> Result<f64, ConversionError> {
    let lambda_vac = validate_wavelength(lambda_vac)?;
    Ok(lambda_vac / refractive_index(lambda_vac))
}

/// Convert an air wavelength (Å) to its vacuum wavelength.
///
/// `n` depends on the unknown vacuum wavelength, so this runs a fixed-point
/// iteration `λ_vac ← λ_air · n(λ_vac)` starting from `λ_air`, exactly
/// [`AIR_TO_VACUUM_ITERATIONS`] times.
pub fn air_to_vacuum(lambda_air: f64) -> Result<f64, ConversionError> {
    let lambda_air = validate_wavelength(lambda_air)?;
    let mut lambda_vac = lambda_air;
    for _ in 0..AIR_TO_VACUUM_ITERATIONS {
        lambda_vac = lambda_air * refractive_index(lambda_vac);
    }
    Ok(lambda_vac)
}

/// Convert `wavelength` from one medium to another. Identity when equal.
pub fn convert(wavelength: f64, from: Medium, to: Medium) -> Result<f64, ConversionError> {
    match (from, to) {
        (Medium::Vacuum, Medium::Air) => vacuum_to_air(wavelength),
        (Medium::Air, Medium::Vacuum) => air_to_vacuum(wavelength),
        _ => Ok(wavelength),
    }
}

/// Whether displaying `line` in the requested medium requires a conversion.
pub fn needs_conversion(line: &EmissionLine, show_vacuum: bool) -> bool {
    line.is_vacuum() != show_vacuum
}

/// The wavelength to display for `line` given the viewer's medium.
///
/// A record already in the requested medium is returned untouched, so there
/// is no round-trip drift.
pub fn display_wavelength(line: &EmissionLine, show_vacuum: bool) -> Result<f64, ConversionError> {
    if !needs_conversion(line, show_vacuum) {
        return Ok(line.wavelength());
    }
    convert(
        line.wavelength(),
        line.medium(),
        Medium::from_show_vacuum(show_vacuum),
    )
}

/// Fixed-decimal rendering used by the table (3 decimals by default).
pub fn format_wavelength(wavelength: f64, decimals: usize) -> String {
    format!("{wavelength:.decimals$}")
}
