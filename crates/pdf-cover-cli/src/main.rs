//! PDF Cover CLI - Command line tool for adding covers and a logo watermark to PDF documents.

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf_cover_core::{
    AppConfig, CoverStamper, FailurePolicy, NamingScheme, ProcessedFile, Upload, unique_names,
    write_archive,
};
use std::path::{Path, PathBuf};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "pdf-cover")]
#[command(author, version, about = "Add covers and a logo watermark to PDF documents", long_about = None)]
struct Args {
    /// Input PDF files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file name (single input, or the archive name with --zip)
    #[arg(short, long)]
    output: Option<String>,

    /// Prefix for output file names (e.g. "simplified" gives simplified_report.pdf)
    #[arg(short, long)]
    prefix: Option<String>,

    /// Pack all outputs into one zip archive
    #[arg(long)]
    zip: bool,

    /// Directory the outputs are written to
    #[arg(short = 'd', long, default_value = ".")]
    out_dir: PathBuf,

    /// Directory holding front_cover.pdf, back_cover.pdf and logo.png
    #[arg(short, long, env = "PDF_COVER_ASSETS")]
    assets: Option<PathBuf>,

    /// Skip inputs that cannot be processed instead of aborting
    #[arg(long)]
    skip_failed: bool,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// What a run writes to the output directory.
#[derive(Debug, PartialEq, Eq)]
enum Plan {
    /// One PDF per input
    Files(NamingScheme),
    /// A single archive with one entry per input
    Archive { name: String, naming: NamingScheme },
}

fn plan(args: &Args, config: &AppConfig) -> Result<Plan> {
    let prefix = args.prefix.as_deref();

    if args.zip {
        let name = match args.output.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => with_extension(n, "zip"),
            _ => config.output.archive_name.clone(),
        };
        return Ok(Plan::Archive {
            name,
            naming: NamingScheme::prefix_or_original(prefix),
        });
    }

    if args.inputs.len() == 1 {
        let naming = match NamingScheme::explicit_or_original(args.output.as_deref()) {
            NamingScheme::Original => NamingScheme::prefix_or_original(prefix),
            explicit => explicit,
        };
        return Ok(Plan::Files(naming));
    }

    if args.output.is_some() {
        bail!("--output names a single file; use --prefix or --zip with several inputs");
    }

    let naming = match NamingScheme::prefix_or_original(prefix) {
        NamingScheme::Original => NamingScheme::Suffix(config.output.suffix.clone()),
        scheme => scheme,
    };
    Ok(Plan::Files(naming))
}

fn with_extension(name: &str, ext: &str) -> String {
    if name.to_ascii_lowercase().ends_with(&format!(".{ext}")) {
        name.to_string()
    } else {
        format!("{name}.{ext}")
    }
}

fn read_inputs(inputs: &[PathBuf], skip_failed: bool) -> Result<Vec<Upload>> {
    let mut uploads = Vec::with_capacity(inputs.len());
    for path in inputs {
        match std::fs::read(path) {
            Ok(bytes) => {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("document.pdf");
                uploads.push(Upload::new(name, bytes));
            }
            Err(e) if skip_failed => warn!("Skipping {}: {}", path.display(), e),
            Err(e) => {
                return Err(e).context(format!("Failed to read input: {}", path.display()));
            }
        }
    }
    Ok(uploads)
}

/// True when `target` already exists and is one of the inputs.
fn is_input(target: &Path, inputs: &[PathBuf]) -> bool {
    let Ok(target) = target.canonicalize() else {
        return false;
    };
    inputs
        .iter()
        .filter_map(|input| input.canonicalize().ok())
        .any(|input| input == target)
}

fn ensure_not_input(target: &Path, inputs: &[PathBuf]) -> Result<()> {
    if is_input(target, inputs) {
        bail!(
            "Refusing to overwrite input file {}; choose another --out-dir, --output or --prefix",
            target.display()
        );
    }
    Ok(())
}

/// Output paths for loose files; repeated names get a counter like archive entries.
fn output_paths(files: &[ProcessedFile], out_dir: &Path) -> Vec<PathBuf> {
    unique_names(files.iter().map(|f| f.name.as_str()))
        .into_iter()
        .map(|name| out_dir.join(name))
        .collect()
}

fn write_files(files: &[ProcessedFile], out_dir: &Path, inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let targets = output_paths(files, out_dir);
    for target in &targets {
        ensure_not_input(target, inputs)?;
    }

    for (file, target) in files.iter().zip(&targets) {
        std::fs::write(target, &file.bytes)
            .context(format!("Failed to write output: {}", target.display()))?;
    }
    Ok(targets)
}

fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Override config with CLI arguments
    if let Some(dir) = &args.assets {
        config.assets.dir.clone_from(dir);
    }
    if args.skip_failed {
        config.batch.on_error = FailurePolicy::Skip;
    }

    let plan = plan(&args, &config)?;

    // Assets are checked before any input is touched
    let stamper = CoverStamper::new(config).context("Failed to load cover assets")?;

    let uploads = read_inputs(&args.inputs, args.skip_failed)?;
    if uploads.is_empty() {
        bail!("No readable input files");
    }
    info!("Processing {} file(s)", uploads.len());

    let naming = match &plan {
        Plan::Files(naming) | Plan::Archive { naming, .. } => naming,
    };

    // Setup progress bar
    let pb = ProgressBar::new(u64::try_from(uploads.len()).unwrap_or(u64::MAX));
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let report = stamper
        .process_batch(
            &uploads,
            naming,
            Some(&|done: usize, _total: usize| {
                pb.set_position(u64::try_from(done).unwrap_or(u64::MAX));
            }),
        )
        .context("Processing failed")?;

    pb.finish_and_clear();

    for failure in &report.failures {
        pb.println(format!("Skipped {}: {}", failure.name, failure.error));
    }
    if report.processed.is_empty() {
        bail!("No documents were processed");
    }

    std::fs::create_dir_all(&args.out_dir)
        .context(format!("Failed to create output directory: {}", args.out_dir.display()))?;

    let written = match &plan {
        Plan::Files(_) => write_files(&report.processed, &args.out_dir, &args.inputs)?,
        Plan::Archive { name, .. } => {
            let target = args.out_dir.join(name);
            ensure_not_input(&target, &args.inputs)?;
            let archive = write_archive(&report.processed).context("Failed to build archive")?;
            std::fs::write(&target, archive)
                .context(format!("Failed to write output: {}", target.display()))?;
            vec![target]
        }
    };

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        for path in &written {
            println!("Saved: {}", path.display());
        }
        if !report.is_complete() {
            println!("{} file(s) skipped", report.failures.len());
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn args(cmdline: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("pdf-cover").chain(cmdline.iter().copied())).unwrap()
    }

    #[test]
    fn test_single_input_keeps_name() {
        let plan = plan(&args(&["report.pdf"]), &AppConfig::default()).unwrap();
        assert_eq!(plan, Plan::Files(NamingScheme::Original));
    }

    #[test]
    fn test_single_input_explicit_name_wins() {
        let plan = plan(&args(&["report.pdf", "-o", "final", "-p", "x"]), &AppConfig::default()).unwrap();
        assert_eq!(plan, Plan::Files(NamingScheme::Explicit("final".to_string())));
    }

    #[test]
    fn test_several_inputs_use_suffix() {
        let plan = plan(&args(&["a.pdf", "b.pdf"]), &AppConfig::default()).unwrap();
        assert_eq!(plan, Plan::Files(NamingScheme::Suffix("_CS".to_string())));

        let plan = super::plan(&args(&["a.pdf", "b.pdf", "--prefix", "v2"]), &AppConfig::default()).unwrap();
        assert_eq!(plan, Plan::Files(NamingScheme::Prefix("v2".to_string())));
    }

    #[test]
    fn test_output_rejected_for_several_loose_files() {
        assert!(plan(&args(&["a.pdf", "b.pdf", "-o", "x.pdf"]), &AppConfig::default()).is_err());
    }

    #[test]
    fn test_zip_plan() {
        let plan_default = plan(&args(&["a.pdf", "b.pdf", "--zip", "-p", "simplified"]), &AppConfig::default()).unwrap();
        assert_eq!(
            plan_default,
            Plan::Archive {
                name: "processed_pdfs.zip".to_string(),
                naming: NamingScheme::Prefix("simplified".to_string()),
            }
        );

        let plan_named = plan(&args(&["a.pdf", "--zip", "-o", "bundle"]), &AppConfig::default()).unwrap();
        assert_eq!(
            plan_named,
            Plan::Archive {
                name: "bundle.zip".to_string(),
                naming: NamingScheme::Original,
            }
        );
    }

    #[test]
    fn test_refuses_to_overwrite_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("report.pdf");
        std::fs::write(&input, b"%PDF").unwrap();

        assert!(ensure_not_input(&input, std::slice::from_ref(&input)).is_err());
        assert!(ensure_not_input(&dir.path().join("other.pdf"), &[input]).is_ok());
    }

    #[test]
    fn test_same_named_outputs_do_not_overwrite_each_other() {
        let dir = tempfile::tempdir().unwrap();
        let file = |bytes: &[u8]| ProcessedFile {
            name: "x_CS.pdf".to_string(),
            bytes: bytes.to_vec(),
            page_count: 1,
        };
        let files = [file(b"first"), file(b"second")];

        let written = write_files(&files, dir.path(), &[]).unwrap();
        assert_eq!(written, vec![dir.path().join("x_CS.pdf"), dir.path().join("x_CS (2).pdf")]);
        assert_eq!(std::fs::read(&written[0]).unwrap(), b"first");
        assert_eq!(std::fs::read(&written[1]).unwrap(), b"second");
    }

    #[test]
    fn test_unreadable_input_skipped_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.pdf");
        std::fs::write(&present, b"%PDF").unwrap();
        let inputs = vec![present, dir.path().join("missing.pdf")];

        assert!(read_inputs(&inputs, false).is_err());
        let uploads = read_inputs(&inputs, true).unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].name, "a.pdf");
    }
}
