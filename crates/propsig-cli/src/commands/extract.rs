//! Extract command - read the signature fields of one saved page.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use propsig_core::{
    DocumentFieldResolver, ExtractedFields, RawPageContent, Resolution, SemanticStrategy,
};

use super::load_config;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Saved document page (HTML)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Use pattern rules only, without calling the semantic service
    #[arg(long)]
    offline: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let html = fs::read_to_string(&args.input)?;
    let content = RawPageContent::from_page_html(&html);
    if content.text().is_empty() {
        anyhow::bail!("No page text in {}", args.input.display());
    }

    let api_key = if args.offline { None } else { config.api_key() };
    let primary = SemanticStrategy::from_config(&config.semantic, api_key)?;
    let resolver =
        DocumentFieldResolver::new(primary).with_primary_attempts(config.batch.primary_attempts);

    let resolution = resolver.resolve_content(content);
    info!(
        "Resolved {} via {} ({}/4 fields)",
        args.input.display(),
        resolution.source,
        resolution.fields.found_count()
    );

    let output = match args.format {
        OutputFormat::Json => format_json(&resolution)?,
        OutputFormat::Text => format_text(&resolution),
    };

    match args.output {
        Some(path) => {
            fs::write(&path, &output)?;
            println!(
                "{} Output written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", output),
    }

    Ok(())
}

fn format_json(resolution: &Resolution) -> anyhow::Result<String> {
    let mut value = serde_json::to_value(&resolution.fields)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "source".to_string(),
            serde_json::Value::String(resolution.source.to_string()),
        );
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

fn format_text(resolution: &Resolution) -> String {
    let ExtractedFields {
        signed_by,
        signed_date,
        ip_address,
        sent_by,
    } = &resolution.fields;

    let mut output = String::new();
    output.push_str(&format!("Signed by:   {}\n", or_dash(signed_by)));
    output.push_str(&format!("Signed date: {}\n", or_dash(signed_date)));
    output.push_str(&format!("IP address:  {}\n", or_dash(ip_address)));
    output.push_str(&format!("Sent by:     {}\n", or_dash(sent_by)));
    output.push_str(&format!("\nSource: {}", resolution.source));

    if let Some(reason) = &resolution.primary_error {
        output.push_str(&format!(" ({})", reason));
    }

    output
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}
