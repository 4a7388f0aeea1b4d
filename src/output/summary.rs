//! End-of-run summary
//!
//! Counts download outcomes by kind so the CLI and the status log can report
//! how a crawl went.

use crate::model::DownloadOutcome;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Outcome counts for one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    /// Unique candidates collected by the aggregator
    pub candidates: usize,

    /// Illustrations kept after ranking
    pub selected: usize,

    /// Files written to the output directory
    pub saved: usize,

    /// Skipped items keyed by reason label
    pub skipped: BTreeMap<&'static str, usize>,
}

impl CrawlSummary {
    /// Builds a summary from the downloader's outcomes
    ///
    /// # Arguments
    ///
    /// * `candidates` - Size of the aggregated pool before ranking
    /// * `outcomes` - One outcome per selected illustration
    pub fn from_outcomes(candidates: usize, outcomes: &[DownloadOutcome]) -> Self {
        let mut summary = Self {
            candidates,
            selected: outcomes.len(),
            ..Self::default()
        };

        for outcome in outcomes {
            match outcome.skip_reason() {
                None => summary.saved += 1,
                Some(reason) => *summary.skipped.entry(reason.label()).or_insert(0) += 1,
            }
        }

        summary
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    /// Percentage of selected illustrations that were saved
    pub fn success_rate(&self) -> f64 {
        if self.selected == 0 {
            0.0
        } else {
            (self.saved as f64 / self.selected as f64) * 100.0
        }
    }
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(summary: &CrawlSummary, output_dir: &Path) {
    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  Candidates collected: {}", summary.candidates);
    println!("  Selected for download: {}", summary.selected);
    println!("  Saved: {}", summary.saved);
    println!("  Skipped: {}", summary.skipped_total());
    println!();

    if !summary.skipped.is_empty() {
        println!("Skipped by Reason:");
        let mut counts: Vec<_> = summary.skipped.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1));

        for (reason, count) in counts {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} images saved to {})",
        summary.success_rate(),
        summary.saved,
        summary.selected,
        output_dir.display()
    );
}
