use std::fs;
use std::path::Path;

use etalase_core::sync::ImageFailure;
use etalase_core::{SyncScope, SyncSummary};

use crate::commands::common::build_engine;
use crate::error::CliError;

pub async fn run_sync(
    scope: SyncScope,
    failures_csv: Option<&Path>,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let engine = build_engine(db_path).await?;
    tracing::info!(%scope, db = %db_path.display(), "Manual sync requested");
    let summary = engine.run(scope).await?;

    if let Some(path) = failures_csv {
        write_failures_csv(path, &summary.report.image_failures)?;
        println!(
            "Wrote {} image upload failure(s) to {}",
            summary.report.image_failures.len(),
            path.display()
        );
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for line in format_summary_lines(&summary) {
            println!("{line}");
        }
    }

    if summary.report.kind_failures.is_empty() {
        Ok(())
    } else {
        let kinds = summary
            .report
            .kind_failures
            .iter()
            .map(|failure| failure.kind.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(CliError::SyncIncomplete(kinds))
    }
}

pub fn write_failures_csv(path: &Path, failures: &[ImageFailure]) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, render_failures_csv(failures)?)?;
    Ok(())
}

/// `source,reason` rows, every cell JSON-quoted so commas and quotes survive.
pub fn render_failures_csv(failures: &[ImageFailure]) -> Result<String, CliError> {
    let mut out = String::from("source,reason\n");
    for failure in failures {
        out.push_str(&serde_json::to_string(&failure.source)?);
        out.push(',');
        out.push_str(&serde_json::to_string(&failure.reason)?);
        out.push('\n');
    }
    Ok(out)
}

pub fn format_summary_lines(summary: &SyncSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Sync ({}) finished at {}",
        summary.scope, summary.last_sync
    )];

    for kind in summary.scope.kinds() {
        let failed = summary.report.failures_for(*kind);
        lines.push(format!(
            "  {kind}: {} seen, {failed} failed",
            summary.count(*kind)
        ));
    }

    let images = summary.report.images;
    lines.push(format!(
        "  images: {} attempted, {} migrated, {} failed, {} skipped",
        images.attempted, images.migrated, images.failed, images.skipped
    ));

    for failure in &summary.report.kind_failures {
        lines.push(format!("  {} unavailable: {}", failure.kind, failure.reason));
    }
    for failure in &summary.report.record_failures {
        lines.push(format!(
            "  {} {} skipped: {}",
            failure.kind,
            failure.external_id.as_deref().unwrap_or("<no id>"),
            failure.reason
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use etalase_core::sync::{ImageStats, KindFailure, RecordFailure, SyncReport};
    use etalase_core::upstream::CollectionKind;
    use pretty_assertions::assert_eq;

    fn summary() -> SyncSummary {
        SyncSummary {
            scope: SyncScope::All,
            resellers: 3,
            products: 2,
            bundling: 0,
            last_sync: "2026-01-02T03:04:05.000Z".to_string(),
            report: SyncReport {
                record_failures: vec![RecordFailure {
                    kind: CollectionKind::Products,
                    external_id: Some("P9".to_string()),
                    reason: "Invalid price in harga_umum".to_string(),
                }],
                kind_failures: vec![KindFailure {
                    kind: CollectionKind::Bundling,
                    reason: "HTTP 503".to_string(),
                }],
                images: ImageStats {
                    attempted: 4,
                    migrated: 3,
                    failed: 1,
                    skipped: 0,
                },
                image_failures: Vec::new(),
            },
        }
    }

    #[test]
    fn empty_failures_csv_has_only_header() {
        assert_eq!(render_failures_csv(&[]).unwrap(), "source,reason\n");
    }

    #[test]
    fn failures_csv_quotes_cells() {
        let failures = vec![ImageFailure {
            source: "https://img.test/a,b.jpg".to_string(),
            destination: "product-P1-image.jpg".to_string(),
            reason: "status=404 \"missing\"".to_string(),
        }];

        let csv = render_failures_csv(&failures).unwrap();

        assert_eq!(
            csv,
            "source,reason\n\"https://img.test/a,b.jpg\",\"status=404 \\\"missing\\\"\"\n"
        );
    }

    #[test]
    fn failures_csv_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("failures.csv");
        let failures = vec![ImageFailure {
            source: "https://img.test/p.jpg".to_string(),
            destination: "product-P1-image.jpg".to_string(),
            reason: "timeout".to_string(),
        }];

        write_failures_csv(&path, &failures).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "source,reason\n\"https://img.test/p.jpg\",\"timeout\"\n"
        );
    }

    #[test]
    fn summary_lines_cover_counts_and_failures() {
        let lines = format_summary_lines(&summary());

        assert_eq!(lines[0], "Sync (all) finished at 2026-01-02T03:04:05.000Z");
        assert_eq!(lines[1], "  resellers: 3 seen, 0 failed");
        assert_eq!(lines[2], "  products: 2 seen, 1 failed");
        assert_eq!(lines[3], "  bundling: 0 seen, 0 failed");
        assert_eq!(
            lines[4],
            "  images: 4 attempted, 3 migrated, 1 failed, 0 skipped"
        );
        assert_eq!(lines[5], "  bundling unavailable: HTTP 503");
        assert_eq!(
            lines[6],
            "  products P9 skipped: Invalid price in harga_umum"
        );
    }
}
