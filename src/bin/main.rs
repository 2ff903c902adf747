use clap::Parser;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "aamva-verify")]
#[command(about = "Browser-driven verification of the AAMVA barcode form app")]
#[command(version)]
struct Cli {
    /// Config file to run (defaults apply when omitted)
    config: Option<PathBuf>,

    /// Target URL (overrides config and host/port)
    #[arg(long)]
    url: Option<String>,

    /// Run with a visible browser window
    #[arg(long)]
    headed: bool,

    /// Evidence screenshot path (overrides config)
    #[arg(long)]
    evidence: Option<String>,

    /// Validate config without running
    #[arg(long)]
    check: bool,

    /// Verbose output (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> aamva_verify::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut config = match cli.config {
        Some(ref path) => aamva_verify::Config::load(path)?,
        None => aamva_verify::Config::default(),
    };

    // Apply CLI overrides
    if let Some(url) = cli.url {
        config.target.url = Some(url);
    }
    if cli.headed {
        config.browser.headless = false;
    }
    if let Some(evidence) = cli.evidence {
        config.evidence_path = evidence;
    }

    if cli.check {
        config.validate()?;
        println!("Config valid");
        println!("  Target: {}", config.target.url());
        println!(
            "  Scenario: {} v{}, {} field(s)",
            config.scenario.jurisdiction,
            config.scenario.version,
            config.scenario.fields.len()
        );
        if let Some(ref expected) = config.scenario.expect_error {
            println!("  Expecting error: '{}'", expected);
        }
        println!("  Evidence: {}", config.evidence_path);
        return Ok(());
    }

    println!("Verifying: {}", config.target.url());

    let report = aamva_verify::Harness::run(&config).await?;

    // Print result
    println!();
    if report.passed {
        println!("✓ Verified");
    } else {
        println!("✗ Failed");
        if let Some(ref failure) = report.failure {
            println!("  Error: {}", failure);
        }
    }
    println!("  Steps: {}", report.steps_applied);
    if let Some(surface) = report.surface {
        println!("  Surface: {}x{}", surface.width, surface.height);
    }
    println!("  Duration: {}ms", report.duration_ms);
    if let Some(ref evidence) = report.evidence {
        println!("  Evidence: {}", evidence);
    }

    if !report.passed {
        std::process::exit(1);
    }

    Ok(())
}
