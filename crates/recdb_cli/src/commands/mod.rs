//! CLI command implementations.

pub mod layout;
pub mod load;

/// Output formats accepted by `--format`.
pub(crate) fn check_format(format: &str) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        "text" | "json" => Ok(()),
        other => Err(format!("unknown format {other:?}, expected text or json").into()),
    }
}
