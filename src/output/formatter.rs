//! Output formatters for recommendation reports

use crate::config::{OutputConfig, OutputFormat};
use crate::error::{RecommenderError, Result};
use crate::output::report::{Recommendation, RecommendationReport};
use colored::{Color, Colorize};
use std::path::Path;

pub trait OutputFormatter {
    fn format_report(&self, report: &RecommendationReport) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// JSON array of recommendations, the default machine-readable output
pub struct JsonFormatter {
    pretty: bool,
}

/// Colored terminal output
pub struct ConsoleFormatter {
    use_colors: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

/// Picks the formatter for the requested output format
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &RecommendationReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(&report.recommendations)?)
        } else {
            Ok(serde_json::to_string(&report.recommendations)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str) -> String {
        if self.use_colors {
            format!("\n{}\n", title.color(Color::Blue).bold())
        } else {
            format!("\n{}\n", title)
        }
    }

    fn format_score_badge(&self, score: f64) -> String {
        let color = match score {
            s if s >= 0.75 => Color::Green,
            s if s >= 0.5 => Color::Yellow,
            _ => Color::Red,
        };
        let badge = format!("[{:.2}]", score);
        if self.use_colors {
            badge.color(color).bold().to_string()
        } else {
            badge
        }
    }

    fn format_recommendation(&self, rec: &Recommendation) -> String {
        let listing = &rec.scored.listing;
        let mut output = format!(
            "{}. {} {} (id {})\n",
            rec.rank,
            self.format_score_badge(rec.scored.final_score),
            self.colorize(&listing.title, Color::Cyan),
            listing.id
        );

        output.push_str(&format!("   Location: {}", listing.location));
        if let Some(distance) = rec.scored.distance_km {
            output.push_str(&format!(" ({:.1} km)", distance));
        }
        output.push('\n');
        output.push_str(&format!("   Stipend: {:.0}", listing.stipend));
        if let Some(deadline) = listing.deadline {
            output.push_str(&format!(" | Apply by: {}", deadline.format("%Y-%m-%d")));
        }
        output.push('\n');

        let c = &rec.scored.component_scores;
        output.push_str(&format!(
            "   Scores: semantic {:.2}, skills {:.2}, location {:.2}, stipend {:.2}, deadline {:.2}\n",
            c.semantic, c.skill_overlap, c.location, c.stipend, c.deadline
        ));

        for tag in &rec.scored.explanation_tags {
            output.push_str(&format!("   {} {}\n", self.colorize("+", Color::Green), tag));
        }
        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &RecommendationReport) -> Result<String> {
        let meta = &report.metadata;
        let mut output = self.format_header("INTERNSHIP RECOMMENDATIONS");
        output.push_str(&format!(
            "{} listings, {} passed the skill filter | model: {} | {}ms\n",
            meta.total_listings, meta.passed_filter, meta.embedding_model, meta.processing_time_ms
        ));

        if report.is_empty() {
            output.push_str(&format!(
                "\n{}\n",
                self.colorize("No internships matched your skills.", Color::Yellow)
            ));
            return Ok(output);
        }

        output.push('\n');
        for rec in &report.recommendations {
            output.push_str(&self.format_recommendation(rec));
            output.push('\n');
        }

        if meta.embedding_failures > 0 {
            output.push_str(&self.colorize(
                &format!(
                    "Note: {} listings could not be embedded and got a zero semantic score\n",
                    meta.embedding_failures
                ),
                Color::Yellow,
            ));
        }
        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    /// Escape characters that would break a table cell
    fn cell(text: &str) -> String {
        text.replace('|', "\\|").replace('\n', " ")
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, report: &RecommendationReport) -> Result<String> {
        let mut output = String::from("# Internship Recommendations\n\n");

        if self.include_metadata {
            let meta = &report.metadata;
            output.push_str(&format!(
                "**Generated:** {} | **Model:** `{}` | **Processing Time:** {}ms\n\n",
                meta.generated_at.format("%Y-%m-%d %H:%M:%S"),
                meta.embedding_model,
                meta.processing_time_ms
            ));
            output.push_str(&format!(
                "{} of {} listings passed the skill filter.\n\n",
                meta.passed_filter, meta.total_listings
            ));
        }

        if report.is_empty() {
            output.push_str("_No internships matched your skills._\n");
            return Ok(output);
        }

        output.push_str("| Rank | Title | Location | Stipend | Deadline | Score |\n");
        output.push_str("|------|-------|----------|---------|----------|-------|\n");
        for rec in &report.recommendations {
            let listing = &rec.scored.listing;
            output.push_str(&format!(
                "| {} | {} | {} | {:.0} | {} | {:.2} |\n",
                rec.rank,
                Self::cell(&listing.title),
                Self::cell(&listing.location),
                listing.stipend,
                listing
                    .deadline
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string()),
                rec.scored.final_score
            ));
        }
        output.push('\n');

        for rec in &report.recommendations {
            output.push_str(&format!(
                "## {}. {} (id {})\n\n",
                rec.rank, rec.scored.listing.title, rec.scored.listing.id
            ));
            for tag in &rec.scored.explanation_tags {
                output.push_str(&format!("- {}\n", tag));
            }
            output.push('\n');
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl ReportGenerator {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(config.color_output),
            json_formatter: JsonFormatter::new(config.pretty_json),
            markdown_formatter: MarkdownFormatter::new(true),
        }
    }

    pub fn generate_report(&self, report: &RecommendationReport, format: OutputFormat) -> Result<String> {
        let formatter: &dyn OutputFormatter = match format {
            OutputFormat::Console => &self.console_formatter,
            OutputFormat::Json => &self.json_formatter,
            OutputFormat::Markdown => &self.markdown_formatter,
        };
        debug_assert_eq!(formatter.supports_format(), format);
        formatter.format_report(report)
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    use std::fs;
    if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(file_path, content).map_err(|e| {
        RecommenderError::OutputFormatting(format!("Failed to write {}: {}", file_path.display(), e))
    })
}
