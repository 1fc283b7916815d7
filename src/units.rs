use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WeightError {
    #[error("Invalid weight format: {0}")]
    InvalidFormat(String),
}

/// Suffixes are matched by substring in this order, so `mg` and `kg` must be
/// tried before the bare `g`.
static UNITS: [(&[&str], f64); 5] = [
    (&["µg", "ug"], 1e-6),
    (&["mg"], 1e-3),
    (&["kg"], 1e3),
    (&["g"], 1.0),
    (&["t"], 1e6),
];

/// Converts a weight such as `"500mg"`, `"1.2kg"` or `"3t"` to grams.
pub fn convert_weight_to_grams(weight: &str) -> Result<f64, WeightError> {
    let weight = weight.trim().to_lowercase();

    let (suffixes, factor) = UNITS
        .iter()
        .find(|(suffixes, _)| suffixes.iter().any(|s| weight.contains(s)))
        .ok_or_else(|| {
            WeightError::InvalidFormat(format!(
                "unit not recognized in {:?}, use µg, mg, g, kg or t",
                weight
            ))
        })?;

    let number = suffixes
        .iter()
        .fold(weight.clone(), |acc, s| acc.replace(s, ""));
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| WeightError::InvalidFormat(format!("{:?} is not a number", number.trim())))?;

    Ok(value * factor)
}

/// Parses a free-text nutrition value like `"12,5 g"`. Anything unparseable
/// becomes `0.0`.
pub fn safe_convert(value: &str, unit: &str) -> f64 {
    let stripped = if unit.is_empty() {
        value.to_string()
    } else {
        value.replace(unit, "")
    };
    stripped.trim().replace(',', ".").parse().unwrap_or(0.0)
}
