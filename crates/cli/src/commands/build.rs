use anyhow::{Context, Result};
use folio_core::Site;
use folio_generator::{generate_site, write_site};
use folio_validator::validate_site;
use std::path::{Path, PathBuf};

/// Build the static site
pub async fn run(path: PathBuf, output: Option<PathBuf>) -> Result<()> {
    println!("🔨 Building static site...");
    println!("   Source: {}", path.display());

    if !path.exists() {
        anyhow::bail!("Site directory does not exist: {}", path.display());
    }

    let site = Site::load(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    let output = output.unwrap_or_else(|| site.output_dir());
    println!("   Output: {}", output.display());
    println!();

    println!("✓ Loaded: {}", site.config.site.title);
    println!("  Documents: {}", site.store.all_documents().len());
    println!();

    let written = build_into(&site, &output, false)?;

    println!();
    println!("✅ Build complete!");
    println!("   Wrote {} files to {}", written, output.display());
    println!();
    println!("To test locally:");
    println!("   folio preview {}", path.display());
    println!();

    Ok(())
}

/// Validate `site`, render every route and write the result to `output`.
///
/// Nothing is written when validation reports errors.
pub fn build_into(site: &Site, output: &Path, is_preview: bool) -> Result<usize> {
    let report = validate_site(site).context("Validation queries failed")?;
    for warning in &report.warnings {
        println!("   ⚠ {}", warning);
    }
    if !report.is_ok() {
        for error in &report.errors {
            eprintln!("   ✗ {}", error);
        }
        anyhow::bail!(
            "Validation failed with {} error(s); run 'folio validate' for details",
            report.errors.len()
        );
    }

    println!("📄 Generating pages...");
    let generated = generate_site(site, is_preview)?;
    println!("   ✓ Rendered {} pages", generated.pages.len());

    let written = write_site(&generated, output)?;
    println!("   ✓ Wrote {} files", written);
    Ok(written)
}
