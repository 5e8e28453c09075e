//! Encodage des couleurs KML (`aabbggrr`)

use crate::error::{LotPlanError, Result};

/// Convertit `#RRGGBB` + opacité (%) en couleur KML `aabbggrr`.
///
/// L'alpha vaut `255 * opacité / 100` tronqué ; l'opacité est bornée à 100.
/// La sortie est toujours en hexadécimal minuscule.
///
/// # Errors
///
/// `LotPlanError::InvalidColor` si la couleur n'a pas exactement 6 chiffres hexadécimaux.
pub fn to_export_color(hex_rgb: &str, opacity_percent: u8) -> Result<String> {
    let digits = hex_rgb.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);

    let rgb = hex::decode(digits).map_err(|_| LotPlanError::InvalidColor(hex_rgb.to_string()))?;
    let &[r, g, b] = rgb.as_slice() else {
        return Err(LotPlanError::InvalidColor(hex_rgb.to_string()));
    };

    let alpha = 255 * u32::from(opacity_percent.min(100)) / 100;
    Ok(format!("{:02x}{:02x}{:02x}{:02x}", alpha, b, g, r))
}

/// Couleur de contour : toujours opaque
pub fn outline_color(hex_rgb: &str) -> Result<String> {
    to_export_color(hex_rgb, 100)
}
