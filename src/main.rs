mod aggregate;
mod extractor;
mod fetch;
mod links;
mod model;
mod pipeline;
mod record;
mod render;
mod settings;
mod sink;
#[cfg(test)]
mod testing;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use extractor::retry::TokioSleeper;
use fetch::HttpFetcher;
use model::GeminiClient;
use pipeline::Pipeline;
use settings::{EmptySitePolicy, Settings, WriteMode};
use sink::CsvSink;

#[derive(Parser)]
#[command(
    name = "company_profiler",
    about = "Profile companies from their about/company pages via an LLM"
)]
struct Cli {
    /// Homepage URLs to profile (default: sites from the config file)
    sites: Vec<String>,
    /// Settings file (default: profiler.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Output CSV path
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Replace the output file instead of appending to it
    #[arg(long)]
    overwrite: bool,
    /// Max model calls per site
    #[arg(long)]
    max_retries: Option<u32>,
    /// Write a "No content available" row for sites with no relevant links
    #[arg(long)]
    include_empty: bool,
}

impl Cli {
    fn apply(self, mut settings: Settings) -> Settings {
        if !self.sites.is_empty() {
            settings.sites = self.sites;
        }
        if let Some(output) = self.output {
            settings.output = output;
        }
        if self.overwrite {
            settings.write_mode = WriteMode::Overwrite;
        }
        if let Some(n) = self.max_retries {
            settings.max_retries = n;
        }
        if self.include_empty {
            settings.empty_site_policy = EmptySitePolicy::Record;
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config_path = cli.config.clone();
    let settings = cli
        .apply(Settings::load(config_path.as_deref())?)
        .with_credential_from_env()?;
    settings.validate()?;

    let fetcher = HttpFetcher::new(&settings)?;
    let model = GeminiClient::new(&settings)?;
    let sleeper = TokioSleeper;

    let pb = ProgressBar::new(settings.sites.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );

    println!("Profiling {} sites with {}...", settings.sites.len(), settings.model);
    let pipeline = Pipeline::new(&settings, &fetcher, &model, &sleeper).with_progress(pb);
    let (records, summary) = pipeline.run(&settings.sites).await;

    let sink = CsvSink::new(&settings.output, settings.write_mode);
    sink.write(&records)?;

    println!(
        "Done: {} sites ({} records, {} skipped). Data saved to '{}'.",
        summary.sites,
        summary.records,
        summary.skipped,
        sink.path().display()
    );

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nFinished in {}", format_duration(elapsed));
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
