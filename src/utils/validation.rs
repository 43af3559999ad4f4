// Request parameter validation
// Author: Gabriel Demetrios Lafis

/// Check that every named parameter is present and non-empty.
///
/// The message names all required parameters, not just the missing ones.
pub fn require_params(params: &[(&str, Option<&str>)]) -> Result<(), String> {
    let missing = params
        .iter()
        .any(|(_, value)| value.map_or(true, |v| v.trim().is_empty()));

    if !missing {
        return Ok(());
    }

    let names: Vec<String> = params.iter().map(|(name, _)| format!("'{}'", name)).collect();
    let message = match names.len() {
        1 => format!("{} is required.", names[0]),
        2 => format!("Both {} and {} are required.", names[0], names[1]),
        _ => format!("Parameters {} are required.", names.join(", ")),
    };

    Err(message)
}
