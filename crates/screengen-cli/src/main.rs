use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use screengen_compile::{Compiler, FsPackageSource, HttpPackageSource, PackageSource};
use screengen_core::Project;

mod error;

use error::{CliError, ErrorCode};

#[derive(Parser)]
#[command(version, about = "Compile a screen layout project into an ESPHome configuration")]
struct Cli {
    /// Input project file (YAML or JSON)
    #[arg(value_name = "PROJECT")]
    input: PathBuf,

    /// Output file; stdout when omitted
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory hardware packages are resolved against
    #[arg(long, value_name = "DIR", default_value = ".")]
    packages_dir: PathBuf,

    /// Fetch hardware packages from this base URL instead of disk
    #[arg(long, value_name = "URL", conflicts_with = "packages_dir")]
    packages_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version render on stdout and exit cleanly.
            if e.exit_code() == 0 {
                print!("{e}");
                return ExitCode::SUCCESS;
            }
            eprintln!("{e}");
            return ExitCode::from(ErrorCode::Usage as u8);
        }
    };
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.code as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let project = load_project(&cli.input)?;

    let source: Box<dyn PackageSource> = match &cli.packages_url {
        Some(url) => Box::new(HttpPackageSource::new(url.clone())),
        None => Box::new(FsPackageSource::new(&cli.packages_dir)),
    };

    let compiler = Compiler::new(source);
    let yaml = compiler
        .generate(&project)
        .await
        .map_err(|e| CliError::processing(e.to_string()))?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &yaml).map_err(|e| {
                CliError::processing(format!("Could not write {}: {e}", path.display()))
            })?;
            info!(output = %path.display(), bytes = yaml.len(), "configuration written");
        }
        None => print!("{yaml}"),
    }
    Ok(())
}

fn load_project(path: &Path) -> Result<Project, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CliError::input(format!("Could not read project {}: {e}", path.display())))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
        || raw.trim_start().starts_with('{');

    if is_json {
        serde_json::from_str(&raw)
            .map_err(|e| CliError::input(format!("Invalid project JSON: {e}")))
    } else {
        serde_yaml::from_str(&raw)
            .map_err(|e| CliError::input(format!("Invalid project YAML: {e}")))
    }
}
