//! Command-line interface for the bionet library
//!
//! The format of a file is inferred from its extension: `.xml` and `.sbml` are SBML,
//! `.json` is the JSON serialization of the network, `.tsv`, `.tab` and `.txt` are
//! reaction tables and `.kegg` is a KEGG flat file (input only).
//!
//! # Usage
//!
//! ```bash
//! # Convert an SBML Level 2 model to Level 3 with fbc
//! bionet convert -i model_l2.xml -o model_l3.xml
//!
//! # Export the reactions and metabolites of a model as tables
//! bionet convert -i model.xml -o reactions.tsv --metabolites metabolites.tsv
//!
//! # Check that every reference of a model resolves
//! bionet check model.xml
//!
//! # Print a summary of a model
//! bionet info model.json
//! ```

use std::{
    error::Error,
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    process::ExitCode,
};

use bionet::prelude::*;
use clap::{Parser, Subcommand};
use colored::Colorize;

/// Main CLI configuration struct
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Convert a network between formats
    Convert {
        /// Path to the input file
        #[arg(short, long)]
        input: PathBuf,

        /// Path to the output file
        #[arg(short, long)]
        output: PathBuf,

        /// Metabolite table read after, or written next to, a reaction table
        #[arg(short, long)]
        metabolites: Option<PathBuf>,

        /// SBML level of the output
        #[arg(long, default_value_t = 3)]
        level: u32,

        /// SBML version of the output
        #[arg(long, default_value_t = 1)]
        sbml_version: u32,

        /// Write flux bounds as kinetic law parameters instead of using fbc
        #[arg(long)]
        no_fbc: bool,

        /// Prefix reaction and metabolite ids of tables with R_ and M_
        #[arg(long)]
        palsson: bool,
    },
    /// Check that every reference of a network resolves
    Check {
        /// Path to the network
        path: PathBuf,

        /// Also print warnings and informational results
        #[arg(short, long)]
        verbose: bool,
    },
    /// Print a summary of a network
    Info {
        /// Path to the network
        path: PathBuf,
    },
}

/// Formats known by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Sbml,
    Json,
    Table,
    Kegg,
}

impl Format {
    fn of(path: &Path) -> Result<Self, String> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "xml" | "sbml" => Ok(Format::Sbml),
            "json" => Ok(Format::Json),
            "tsv" | "tab" | "txt" => Ok(Format::Table),
            "kegg" => Ok(Format::Kegg),
            _ => Err(format!("Unknown file format of {}", path.display())),
        }
    }
}

fn print_warnings(warnings: &Warnings) {
    if !warnings.is_empty() {
        eprintln!(
            "{}",
            format!("{} warnings raised during the conversion", warnings.len()).yellow()
        );
    }
}

fn read_network(
    path: &Path,
    metabolites: Option<&Path>,
    tabular: &TabularConfig,
) -> Result<BioNetwork, Box<dyn Error>> {
    let network = match Format::of(path)? {
        Format::Sbml => {
            let import = SbmlReader::default().read_path(path)?;
            print_warnings(&import.warnings);
            import.network
        }
        Format::Json => load_network(path)?,
        Format::Table => {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("network")
                .to_string();
            let mut network = BioNetwork::new(name.clone(), name);
            let mut warnings =
                import_reactions(BufReader::new(File::open(path)?), &mut network, tabular)?;
            if let Some(metabolites) = metabolites {
                warnings.extend(import_metabolites(
                    BufReader::new(File::open(metabolites)?),
                    &mut network,
                    tabular,
                )?);
            }
            print_warnings(&warnings);
            network
        }
        Format::Kegg => {
            let mut network = BioNetwork::new("kegg", "KEGG");
            let warnings = import_entries(&std::fs::read_to_string(path)?, &mut network)?;
            print_warnings(&warnings);
            network
        }
    };

    log::info!(
        "Read {} reactions and {} metabolites from {}",
        network.reactions.len(),
        network.metabolites.len(),
        path.display()
    );
    Ok(network)
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            metabolites,
            level,
            sbml_version,
            no_fbc,
            palsson,
        } => {
            let tabular = TabularConfigBuilder::default().palsson_ids(palsson).build()?;
            let input_metabolites = match Format::of(&input)? {
                Format::Table => metabolites.as_deref(),
                _ => None,
            };
            let network = read_network(&input, input_metabolites, &tabular)?;

            match Format::of(&output)? {
                Format::Sbml => {
                    let config = WriterConfigBuilder::default()
                        .level(level)
                        .version(sbml_version)
                        .fbc(!no_fbc)
                        .build()?;
                    let warnings = SbmlWriter::new(config).write_path(&network, &output)?;
                    print_warnings(&warnings);
                }
                Format::Json => save_network(&output, &network)?,
                Format::Table => {
                    let warnings = export_reactions(
                        &network,
                        BufWriter::new(File::create(&output)?),
                        &tabular,
                    )?;
                    print_warnings(&warnings);
                    if let Some(metabolites) = &metabolites {
                        export_metabolites(
                            &network,
                            BufWriter::new(File::create(metabolites)?),
                            &tabular,
                        )?;
                    }
                }
                Format::Kegg => return Err("KEGG flat files can only be read".into()),
            }

            println!(
                "{} {} → {}",
                "Converted".green().bold(),
                input.display(),
                output.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { path, verbose } => {
            let network = read_network(&path, None, &TabularConfig::default())?;
            let mut report = check_consistency(&network);
            if !verbose {
                report.retain_severity(Severity::Error);
            }
            println!("{report}");

            Ok(if report.is_valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Info { path } => {
            let network = read_network(&path, None, &TabularConfig::default())?;
            println!("{network}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Main entry point for the CLI application
pub fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
