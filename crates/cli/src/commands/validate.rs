use anyhow::{Context, Result};
use folio_core::Site;
use folio_validator::validate_site;
use std::path::PathBuf;

pub async fn run(path: PathBuf, json: bool) -> Result<()> {
    let site = Site::load(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    let report = validate_site(&site).context("Validation queries failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validating site at: {}", path.display());
        println!("✓ {} valid", folio_core::config::CONFIG_FILE);
        println!("  Site: {} by {}", site.config.site.title, site.config.site.author);

        for info in &report.info {
            println!("  ℹ {}", info);
        }
        for warning in &report.warnings {
            println!("  ⚠ {}", warning);
        }
        for error in &report.errors {
            eprintln!("  ✗ {}", error);
        }
    }

    if !report.is_ok() {
        anyhow::bail!("Validation failed with {} error(s)", report.errors.len());
    }

    if !json {
        println!("\n✅ No errors");
    }
    Ok(())
}
