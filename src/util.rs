use std::collections::BTreeMap;

// Canonical display name for a raw provider name. Unmapped names pass through.
pub fn sanitize_team_name(name: &str, mapping: &BTreeMap<String, String>) -> String {
    mapping
        .get(name)
        .cloned()
        .unwrap_or_else(|| name.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a finite number: {0:?}")]
pub struct InvalidStatValue(pub String);

// Blank cells and the provider's "-" placeholder mean "no value". Anything
// else has to be a finite number.
pub fn parse_stat_value(raw: &str) -> Result<Option<f64>, InvalidStatValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "-" {
        return Ok(None);
    }

    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(InvalidStatValue(raw.to_string())),
    }
}
