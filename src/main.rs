use cfgl_core::analyze;
use clap::{Parser, ValueEnum};
use miette::{miette, IntoDiagnostic, Report, WrapErr};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

/// Converts configuration language text into JSON.
#[derive(Parser, Debug)]
#[command(name = "cfgl", version, about)]
struct Cli {
    /// Path of the file to write.
    #[arg(short, long, value_name = "PATH")]
    output: PathBuf,

    /// Read the source from this file instead of standard input.
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

/// Installs a log subscriber when `RUST_LOG` is set, e.g. `RUST_LOG=cfgl_core=trace`.
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn read_source(input: Option<&PathBuf>) -> miette::Result<(String, String)> {
    match input {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
            Ok((source, path.display().to_string()))
        }
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .into_diagnostic()
                .wrap_err("Failed to read standard input")?;
            Ok((source, "<stdin>".to_string()))
        }
    }
}

fn run(cli: &Cli) -> miette::Result<()> {
    let (source, name) = read_source(cli.input.as_ref())?;
    log::debug!("read {} bytes from {}", source.len(), name);

    let result = analyze(&source, &name).map_err(Report::new)?;

    let rendered = match cli.format {
        Format::Json => result.to_json().map_err(|e| miette!("{e}")),
        Format::Yaml => result.to_yaml().map_err(|e| miette!("{e}")),
    }
    .wrap_err("Failed to serialize the configuration")?;

    std::fs::write(&cli.output, rendered)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write {}", cli.output.display()))?;
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => {
            eprintln!("Configuration saved to {}", cli.output.display());
            ExitCode::SUCCESS
        }
        Err(report) => {
            eprintln!("{report:?}");
            ExitCode::FAILURE
        }
    }
}
