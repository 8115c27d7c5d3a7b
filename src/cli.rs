use crate::info::PackageInfo;
use crate::parser::ParseOptions;
use crate::pipeline::Pipeline;
use crate::scanner::FileScanner;
use crate::serializer::{serialize_json, serialize_yaml, write_to_file};
use crate::version;
use crate::workers::PackageDefaults;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::path::{Path, PathBuf};

/// Generate an OpenAPI 3.0 document from apiDoc-style annotation comments
#[derive(Parser, Debug)]
#[command(name = "openapi-from-comments")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Source directory or single source file to scan
    #[arg(value_name = "INPUT", default_value = ".")]
    pub input: PathBuf,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output_path: Option<PathBuf>,

    /// Output format (json or yaml)
    #[arg(short = 'f', long = "format", value_enum, default_value = "json")]
    pub output_format: OutputFormat,

    /// Regular expression selecting the files to parse (repeatable)
    #[arg(long = "file-filters", value_name = "REGEX")]
    pub file_filters: Vec<String>,

    /// Regular expression excluding files or directories (repeatable)
    #[arg(long = "exclude-filters", value_name = "REGEX")]
    pub exclude_filters: Vec<String>,

    /// Include blocks marked with @apiPrivate
    #[arg(long = "private")]
    pub private: bool,

    /// Keep descriptions as written instead of rendering markdown
    #[arg(long = "no-markdown")]
    pub no_markdown: bool,

    /// Version assumed for blocks without @apiVersion
    #[arg(long = "default-version", value_name = "X.Y.Z", default_value = "0.0.0")]
    pub default_version: String,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.input.exists() {
        anyhow::bail!("Input path does not exist: {}", args.input.display());
    }

    if version::parse(&args.default_version).is_none() {
        anyhow::bail!("Default version is not a valid version: {}", args.default_version);
    }

    info!("Input: {}", args.input.display());
    info!("Output format: {:?}", args.output_format);
    if let Some(ref output) = args.output_path {
        info!("Output file: {}", output.display());
    } else {
        info!("Output: stdout");
    }

    Ok(args)
}

/// Directory holding `package.json` and the override files for the given input.
fn package_dir(input: &Path) -> &Path {
    if input.is_file() {
        input.parent().unwrap_or_else(|| Path::new("."))
    } else {
        input
    }
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    // Step 1: Find and decode source files
    let scanner = FileScanner::with_filters(args.input.clone(), &args.file_filters, &args.exclude_filters)?;
    let units = scanner.read_sources()?;
    info!("Found {} source files", units.len());

    // Step 2: Project information
    let package = PackageInfo::load(package_dir(&args.input))?;
    debug!("Package info: {:?}", package);

    // Step 3: Parse, resolve and synthesize
    let mut options = ParseOptions {
        show_private: args.private,
        ..ParseOptions::default()
    };
    if args.no_markdown {
        options.markdown = None;
    }
    let defaults = PackageDefaults {
        default_version: args.default_version.clone(),
    };
    let document = Pipeline::new(options, defaults).generate(&units, &package)?;
    info!(
        "OpenAPI document built: {} paths, {} schemas",
        document.paths.len(),
        document.components.schemas.len()
    );

    // Step 4: Serialize to requested format
    let content = match args.output_format {
        OutputFormat::Yaml => serialize_yaml(&document)?,
        OutputFormat::Json => serialize_json(&document)?,
    };

    // Step 5: Output to file or stdout
    if let Some(output_path) = &args.output_path {
        write_to_file(&content, output_path)?;
        info!("Wrote OpenAPI document to {}", output_path.display());
    } else {
        println!("{}", content);
    }

    Ok(())
}
