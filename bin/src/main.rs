//! geoport CLI - export feature service layers as GeoJSON, KML or shapefiles.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use geoport_lib::ExportFormat;
use std::path::PathBuf;

mod commands;
mod display;
mod logging;

#[derive(Parser)]
#[command(name = "geoport")]
#[command(about = "Export feature service layers as GeoJSON, KML or zipped shapefiles", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress progress output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export one or more layers
    Export {
        /// Layer identifiers (e.g., topp:states)
        #[arg(required = true)]
        layers: Vec<String>,

        /// Feature service endpoint URL
        #[arg(short, long, env = "GEOPORT_ENDPOINT")]
        endpoint: String,

        /// Output format (raw, markup, package or an alias)
        #[arg(short, long, env = "GEOPORT_FORMAT", default_value = "raw")]
        format: ExportFormat,

        /// Output directory. Defaults to the user's download directory.
        #[arg(short, long, env = "GEOPORT_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Maximum number of features requested per layer
        #[arg(long, env = "GEOPORT_MAX_FEATURES", default_value = "50000")]
        max_features: u32,

        /// Request timeout in seconds
        #[arg(long, env = "GEOPORT_TIMEOUT", default_value = "300")]
        timeout: u64,
    },

    /// List supported export formats
    Formats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    // Show help if no command provided
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Export {
            layers,
            endpoint,
            format,
            output_dir,
            max_features,
            timeout,
        } => {
            let args = commands::export::ExportArgs {
                layers,
                endpoint,
                format,
                output_dir,
                max_features,
                timeout,
            };
            commands::export::export(args, cli.quiet).await
        }
        Commands::Formats => {
            commands::formats::list_formats();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_export_args() {
        let cli = Cli::try_parse_from([
            "geoport",
            "-vv",
            "export",
            "topp:states",
            "topp:roads",
            "--endpoint",
            "http://localhost/wfs",
            "--format",
            "kml",
            "--max-features",
            "10",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Commands::Export {
                layers,
                format,
                max_features,
                timeout,
                ..
            }) => {
                assert_eq!(layers, ["topp:states", "topp:roads"]);
                assert_eq!(format, ExportFormat::Markup);
                assert_eq!(max_features, 10);
                assert_eq!(timeout, 300);
            }
            _ => panic!("expected export command"),
        }
    }

    #[test]
    fn test_export_rejects_unknown_format() {
        let result = Cli::try_parse_from([
            "geoport",
            "export",
            "parks",
            "--endpoint",
            "http://localhost/wfs",
            "--format",
            "dxf",
        ]);
        assert!(result.is_err());
    }
}
