//! Command handlers for the diagnostic tool.
//!
//! Reports go to stdout as JSON; logs and gate notices go to stderr so the
//! output can be piped straight into `jq`.

use std::path::Path;

use anyhow::Context;
use shelfscan_extract::{
    detect_platform, extract_report, path_matches_product_pattern, ExtractionReport, PageFetcher,
    PageSnapshot,
};

/// Fetch `url`, consult the gate and print the extraction report.
///
/// When the gate rejects the page and `force` is not set, prints a notice
/// and returns without running the pipeline.
pub(crate) async fn run_extract(
    config: &shelfscan_core::AppConfig,
    url: &str,
    force: bool,
    compact: bool,
) -> anyhow::Result<()> {
    let page = fetch(config, url).await?;

    let platform = detect_platform(&page);
    let path_ok = path_matches_product_pattern(&page);
    tracing::info!(url = %page.url(), platform = ?platform, path_ok, force, "gate verdict");
    if !(platform.is_some() && path_ok) && !force {
        eprintln!(
            "skipping {}: {}; pass --force to extract anyway",
            page.url(),
            gate_reason(platform.is_some(), path_ok)
        );
        return Ok(());
    }

    print_report(&extract_report(&page), compact)
}

/// Fetch `url` and print the platform and path verdicts.
pub(crate) async fn run_check(config: &shelfscan_core::AppConfig, url: &str) -> anyhow::Result<()> {
    let page = fetch(config, url).await?;
    let platform = detect_platform(&page);
    let path_ok = path_matches_product_pattern(&page);

    println!("url:            {}", page.url());
    println!(
        "platform:       {}",
        platform.map_or_else(|| "unknown".to_string(), |p| p.to_string())
    );
    println!("product path:   {}", yes_no(path_ok));
    println!("should extract: {}", yes_no(platform.is_some() && path_ok));
    Ok(())
}

/// Run the pipeline over a saved HTML file, bypassing the gate.
pub(crate) fn run_parse(file: &Path, url: &str, compact: bool) -> anyhow::Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let page = PageSnapshot::from_html(url, &html)?;
    print_report(&extract_report(&page), compact)
}

async fn fetch(config: &shelfscan_core::AppConfig, url: &str) -> anyhow::Result<PageSnapshot> {
    let fetcher = PageFetcher::from_config(config).context("failed to build page fetcher")?;
    fetcher
        .fetch_snapshot(url)
        .await
        .with_context(|| format!("failed to fetch {url}"))
}

fn print_report(report: &ExtractionReport, compact: bool) -> anyhow::Result<()> {
    let json = if compact {
        serde_json::to_string(report)?
    } else {
        serde_json::to_string_pretty(report)?
    };
    println!("{json}");
    Ok(())
}

fn gate_reason(known_platform: bool, path_ok: bool) -> &'static str {
    match (known_platform, path_ok) {
        (false, false) => "unknown platform and not a product or collection path",
        (false, true) => "unknown platform",
        (true, false) => "not a product or collection path",
        (true, true) => "gate passed",
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
