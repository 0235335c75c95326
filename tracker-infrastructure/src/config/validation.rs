use anyhow::{anyhow, Result};

use tracker_domain::services::EventExtractor;
use tracker_domain::ExtractorConfig;

pub const MIN_REFERENCE_YEAR: i32 = 1970;
pub const MAX_REFERENCE_YEAR: i32 = 9999;

pub fn validate_positive(name: &str, value: i64) -> Result<()> {
    if value <= 0 {
        return Err(anyhow!("{name} must be greater than 0"));
    }
    Ok(())
}

pub fn validate_reference_year(year: i32) -> Result<()> {
    if !(MIN_REFERENCE_YEAR..=MAX_REFERENCE_YEAR).contains(&year) {
        return Err(anyhow!(
            "reference_year must be between {MIN_REFERENCE_YEAR} and {MAX_REFERENCE_YEAR}"
        ));
    }
    Ok(())
}

/// Every configured pattern must compile and capture what its kind needs.
pub fn validate_patterns(config: &ExtractorConfig) -> Result<()> {
    EventExtractor::build(config)
        .map(|_| ())
        .map_err(|err| anyhow!("invalid pattern: {}", err))
}
