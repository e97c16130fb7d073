use crate::core::{GenerationSettings, StudioConfig};
use crate::utils::{StudioError, StudioResult};

/// Longest prompt modifier forwarded to the generator
const MAX_PROMPT_MODIFIER_LEN: usize = 2000;

/// Validates a `#rgb` / `#rrggbb` color and returns its hex digits.
pub fn validate_hex_color(value: &str) -> StudioResult<&str> {
    let digits = value
        .trim()
        .strip_prefix('#')
        .ok_or_else(|| StudioError::validation(format!(
            "Invalid color: {value}. Expected a named background or #rrggbb"
        )))?;

    if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(StudioError::validation(format!(
            "Invalid hex color: {value}"
        )));
    }

    Ok(digits)
}

/// Validates generation settings before they are stored as the batch configuration
pub fn validate_settings(settings: &GenerationSettings) -> StudioResult<()> {
    if let Some(modifier) = &settings.prompt_modifier {
        if modifier.len() > MAX_PROMPT_MODIFIER_LEN {
            return Err(StudioError::validation(format!(
                "Prompt modifier too long: {} characters (max {})",
                modifier.len(),
                MAX_PROMPT_MODIFIER_LEN
            )));
        }
    }

    Ok(())
}

/// Validates a loaded configuration file
pub fn validate_config(config: &StudioConfig) -> StudioResult<()> {
    validate_settings(&config.generation)?;

    if config.batch.max_concurrency == Some(0) {
        return Err(StudioError::validation("maxConcurrency cannot be 0"));
    }

    if config.generator.timeout_secs == Some(0) {
        return Err(StudioError::validation("Generator timeout cannot be 0"));
    }

    let prefix = config.export.file_prefix.trim();
    if prefix.is_empty() || prefix.contains(['/', '\\']) {
        return Err(StudioError::validation(format!(
            "Invalid export file prefix: {:?}", config.export.file_prefix
        )));
    }

    let archive = config.export.archive_name.trim();
    if archive.is_empty() || archive.contains(['/', '\\']) {
        return Err(StudioError::validation(format!(
            "Invalid archive name: {:?}", config.export.archive_name
        )));
    }

    Ok(())
}
