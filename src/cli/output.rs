//! Output formatting for multiple formats
//!
//! Every command result can be printed as JSON, YAML or human-readable text.
//! The JSON and YAML renderings are plain serde serializations of the result
//! types; the human rendering is hand-written per result.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::FinsightConfig;
use crate::hardware::{CheckStatus, HealthReport, RequirementReport};
use crate::pipeline::PipelineReport;
use crate::retrieval::{Answer, SearchHit};

const RULE: &str = "\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}\u{2501}";

/// Longest chunk excerpt shown in human search output
const PREVIEW_CHARS: usize = 240;

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    hits: &'a [SearchHit],
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn format_pipeline(&self, report: &PipelineReport) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(pipeline_human(report)),
            _ => self.serialize(report, "pipeline report"),
        }
    }

    pub fn format_search(&self, query: &str, hits: &[SearchHit]) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(search_human(query, hits)),
            _ => self.serialize(&SearchOutput { query, hits }, "search results"),
        }
    }

    pub fn format_answer(&self, answer: &Answer) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(answer_human(answer)),
            _ => self.serialize(answer, "answer"),
        }
    }

    pub fn format_requirements(&self, report: &RequirementReport) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(requirements_human(report)),
            _ => self.serialize(report, "hardware report"),
        }
    }

    pub fn format_health(&self, report: &HealthReport) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(health_human(report)),
            _ => self.serialize(report, "health status"),
        }
    }

    pub fn format_config(&self, config: &FinsightConfig) -> Result<String> {
        match self.format {
            OutputFormat::Human => Ok(config_human(config)),
            _ => self.serialize(&config.to_display_map(), "config"),
        }
    }

    fn serialize<T: Serialize + ?Sized>(&self, value: &T, what: &str) -> Result<String> {
        match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)
                .with_context(|| format!("Failed to serialize {} to YAML", what)),
            _ => serde_json::to_string_pretty(value)
                .with_context(|| format!("Failed to serialize {} to JSON", what)),
        }
    }
}

fn header(output: &mut String, title: &str) {
    output.push_str(title);
    output.push('\n');
    output.push_str(RULE);
    output.push_str("\n\n");
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut)
}

fn pipeline_human(report: &PipelineReport) -> String {
    let mut output = String::new();
    header(&mut output, "\u{2713} Pipeline Complete");

    if let Some(ref tidy) = report.tidy {
        output.push_str("Tidy:\n");
        output.push_str(&format!(
            "\u{251C}\u{2500} Files converted: {}/{}\n",
            tidy.converted(),
            tidy.files.len()
        ));
        for file in tidy.files.iter().filter(|f| f.skipped.is_some()) {
            output.push_str(&format!(
                "\u{251C}\u{2500} Skipped {}: {}\n",
                file.input.display(),
                file.skipped.as_deref().unwrap_or_default()
            ));
        }
        output.push_str(&format!(
            "\u{2514}\u{2500} Dataset rows:    {}\n\n",
            tidy.merge.rows
        ));
    }

    if let Some(ref materialize) = report.materialize {
        let years = materialize
            .years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        output.push_str("Knowledge Base:\n");
        output.push_str(&format!("\u{251C}\u{2500} Years:       {}\n", years));
        output.push_str(&format!(
            "\u{251C}\u{2500} Categories:  {}\n",
            materialize.categories.len()
        ));
        output.push_str(&format!(
            "\u{2514}\u{2500} Documents:   {}\n\n",
            materialize.documents.len()
        ));
    }

    if let Some(ref index) = report.index {
        output.push_str("Index:\n");
        output.push_str(&format!(
            "\u{251C}\u{2500} Model:      {} (dim {})\n",
            index.model, index.dimension
        ));
        output.push_str(&format!(
            "\u{251C}\u{2500} Chunks:     {} from {} documents\n",
            index.chunks, index.documents
        ));
        output.push_str(&format!(
            "\u{2514}\u{2500} Location:   {}\n\n",
            index.index_dir.display()
        ));
    }

    output.push_str(&format!("Processed in {}ms\n", report.total_time_ms));
    output
}

fn search_human(query: &str, hits: &[SearchHit]) -> String {
    let mut output = String::new();
    header(&mut output, &format!("Results for \"{}\"", query));

    if hits.is_empty() {
        output.push_str("No matching chunks.\n");
        return output;
    }
    for hit in hits {
        output.push_str(&format!(
            "[{}] {}  (score {:.3})\n",
            hit.rank,
            hit.citation(),
            hit.score
        ));
        output.push_str(&format!("    {}\n\n", preview(&hit.content)));
    }
    output
}

fn answer_human(answer: &Answer) -> String {
    let mut output = String::new();
    output.push_str(answer.text.trim());
    output.push_str("\n\n");

    if !answer.sources.is_empty() {
        output.push_str("Sources:\n");
        for (i, hit) in answer.sources.iter().enumerate() {
            let connector = if i + 1 == answer.sources.len() {
                "\u{2514}"
            } else {
                "\u{251C}"
            };
            output.push_str(&format!(
                "{}\u{2500} [{}] {}\n",
                connector,
                hit.rank,
                hit.citation()
            ));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "Answered by {} in {}ms\n",
        answer.model, answer.response_time_ms
    ));
    output
}

fn status_symbol(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "\u{2713}",
        CheckStatus::Warn => "\u{26A0}",
        CheckStatus::Fail => "\u{2717}",
    }
}

fn requirements_human(report: &RequirementReport) -> String {
    let mut output = String::new();
    let title = if report.meets_minimum() {
        "\u{2713} Hardware Requirements"
    } else {
        "\u{2717} Hardware Requirements (Below Minimum)"
    };
    header(&mut output, title);

    let caps = &report.capabilities;
    output.push_str(&format!("CPU:     {} ({} cores)\n", caps.cpu_brand, caps.cpu_cores));
    output.push_str(&format!(
        "Memory:  {:.1} GB total, {:.1} GB available\n",
        caps.total_ram_gb(),
        caps.available_ram_gb()
    ));
    match caps.free_disk_gb() {
        Some(gb) => output.push_str(&format!("Disk:    {:.1} GB free\n", gb)),
        None => output.push_str("Disk:    unknown\n"),
    }
    output.push_str(&format!("Device:  {}\n\n", caps.best_device()));

    for check in &report.checks {
        output.push_str(&format!(
            "{} {:<18} {}\n",
            status_symbol(check.status),
            check.name,
            check.detail
        ));
    }

    output.push_str(&format!(
        "\n{} passed, {} warnings, {} failed\n",
        report.count(CheckStatus::Pass),
        report.count(CheckStatus::Warn),
        report.count(CheckStatus::Fail)
    ));
    output
}

fn health_human(report: &HealthReport) -> String {
    let mut output = String::new();
    header(&mut output, "Inference Endpoint Health");

    let healthy = report.is_healthy();
    output.push_str(&format!(
        "{} {}\n",
        if healthy { "\u{2713}" } else { "\u{2717}" },
        report.url
    ));
    output.push_str(&format!(
        "  Status: {}\n",
        if healthy { "Available" } else { "Unavailable" }
    ));
    if let Some(code) = report.status {
        output.push_str(&format!("  HTTP: {}\n", code));
    }
    if let Some(ms) = report.latency_ms {
        output.push_str(&format!("  Latency: {}ms\n", ms));
    }
    if let Some(ref error) = report.error {
        output.push_str(&format!("  Error: {}\n", error));
    }
    output
}

fn config_human(config: &FinsightConfig) -> String {
    let mut output = String::new();
    header(&mut output, "finsight Configuration");

    let map = config.to_display_map();
    let sections: [(&str, &[&str]); 3] = [
        ("Project", &["root", "top_categories"]),
        (
            "Embedding",
            &[
                "embedder",
                "embedding_model",
                "chunk_size",
                "chunk_overlap",
                "embed_batch_size",
            ],
        ),
        (
            "Inference",
            &[
                "llm_provider",
                "llm_model",
                "api_base_url",
                "request_timeout_secs",
                "top_k",
            ],
        ),
    ];

    for (title, keys) in sections {
        output.push_str(&format!("{}:\n", title));
        for key in keys {
            if let Some(value) = map.get(*key) {
                output.push_str(&format!("  {}: {}\n", key, value));
            }
        }
        output.push('\n');
    }
    if let Some(level) = map.get("log_level") {
        output.push_str(&format!("Log level: {}\n", level));
    }
    output
}
