use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use spoiler_core::{
    ChatCompletionsClient, Config, JobSpec, Pipeline, PipelineObserver, Provider, Stage,
    TargetDuration, VideoDbClient, format_output_readable,
};
use tracing_subscriber::EnvFilter;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let whole = d.as_secs();
        format!("{}m {}s", whole / 60, whole % 60)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, ValueEnum)]
enum CliProvider {
    Openai,
    Grok,
    Gemini,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
            CliProvider::Gemini => Provider::Gemini,
        }
    }
}

#[derive(Parser)]
#[command(name = "spoiler")]
#[command(about = "Cut a spoiler highlight reel from a video URL")]
struct Cli {
    /// Video URL
    url: String,

    /// Video title, used in the prompt
    #[arg(short, long)]
    title: String,

    /// Genre (repeatable); "Other" is replaced by --other-genre
    #[arg(short, long = "genre")]
    genres: Vec<String>,

    /// Free-text genre used in place of "Other"
    #[arg(long)]
    other_genre: Option<String>,

    /// Target length in seconds, or percent with --percentage
    #[arg(short, long)]
    duration: f64,

    /// Treat --duration as a percentage of the source length
    #[arg(long)]
    percentage: bool,

    /// AI provider for sentence selection (overrides config)
    #[arg(short, long)]
    provider: Option<CliProvider>,

    /// Config file (defaults to $SPOILER_CONFIG or ~/.config/spoiler/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// One spinner per pipeline stage, finished with its elapsed time.
struct SpinnerObserver {
    current: Option<(Stage, ProgressBar, Instant)>,
}

impl SpinnerObserver {
    fn new() -> Self {
        Self { current: None }
    }

    fn finish_current(&mut self) {
        if let Some((stage, spinner, started)) = self.current.take() {
            spinner.finish_with_message(format!(
                "{} {} {}",
                style("✓").green().bold(),
                stage.label(),
                style(format!("[{}]", format_duration(started.elapsed()))).dim()
            ));
        }
    }

    fn abandon(&mut self) {
        if let Some((stage, spinner, _)) = self.current.take() {
            spinner.abandon_with_message(format!(
                "{} {}",
                style("✗").red().bold(),
                stage.label()
            ));
        }
    }
}

impl PipelineObserver for SpinnerObserver {
    fn stage(&mut self, stage: Stage) {
        self.finish_current();
        let spinner = create_spinner(&format!("{}...", stage.label()));
        self.current = Some((stage, spinner, Instant::now()));
    }

    fn progress(&mut self, percent: f64) {
        if let Some((stage, spinner, _)) = &self.current {
            spinner.set_message(format!("{}... {percent:.0}%", stage.label()));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(provider) = cli.provider {
        config.llm.provider = provider.into();
    }

    // Validate API key early
    if let Err(e) = config.llm.provider.validate_api_key() {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    let target = if cli.percentage {
        TargetDuration::percentage(cli.duration)
    } else {
        TargetDuration::seconds(cli.duration)
    };
    let job = JobSpec {
        video_url: cli.url,
        title: cli.title,
        genres: JobSpec::resolve_genres(cli.genres, cli.other_genre.as_deref()),
        target,
    };

    println!(
        "\n{}  {}\n",
        style("spoiler").cyan().bold(),
        style("Highlight Reel").dim()
    );

    let http = reqwest::Client::new();
    let video = VideoDbClient::new(http.clone(), &config.video)?;
    let llm = ChatCompletionsClient::new(http, &config.llm.provider, config.llm.model.as_deref())?;
    let provider_name = config.llm.provider.name();
    let pipeline = Pipeline::new(Arc::new(video), Arc::new(llm), config);

    println!(
        "{} Selecting with {}",
        style("✓").green().bold(),
        style(provider_name).yellow()
    );
    println!("{}", style("─".repeat(60)).dim());

    let total_start = Instant::now();
    let mut observer = SpinnerObserver::new();
    let output = match pipeline.run(&job, &mut observer).await {
        Ok(output) => {
            observer.finish_current();
            output
        }
        Err(e) => {
            observer.abandon();
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!(
        "{} {}\n",
        style("Stream:").dim(),
        style(&output.stream_url).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());

    println!("{}", format_output_readable(&output));

    Ok(())
}
