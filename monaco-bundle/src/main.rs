use anyhow::{bail, Context};
use clap::Parser;
use monaco_bundle_rs::bundler::{prepare, BundlerOptions, MonacoBundler};
use std::path::PathBuf;

/// monaco-bundle: Prepare monaco-editor sources for browser bundles with runtime localization
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to the extracted monaco-editor package
    #[clap(short, long)]
    pub src_dir: Option<String>,

    /// Directory to write prepared sources and manifest.json to. Defaults to ./dist
    #[clap(short, long)]
    pub output_dir: Option<String>,

    /// Directory containing nls.js and nls-0.50.0.js. Defaults to the bundled shims
    #[clap(long)]
    pub shim_dir: Option<String>,

    /// JSON file with bundler options. Command line flags take precedence
    #[clap(short, long)]
    pub config: Option<String>,

    /// Ask the downstream bundler not to minify
    #[clap(long)]
    pub no_minify: bool,

    /// ECMAScript target for the downstream bundler, e.g. es2022
    #[clap(short, long)]
    pub target: Option<String>,
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path.trim()).as_ref())
}

fn read_config(path: &str) -> Result<BundlerOptions, anyhow::Error> {
    let path = expand(path);
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Merges the config file, if any, with the command line flags.
fn resolve_options(args: &Args) -> Result<BundlerOptions, anyhow::Error> {
    let mut options = match &args.config {
        Some(config) => read_config(config)?,
        None => BundlerOptions::default(),
    };

    if let Some(src_dir) = &args.src_dir {
        options.src_dir = expand(src_dir);
    }
    if let Some(output_dir) = &args.output_dir {
        options.output_dir = Some(expand(output_dir));
    }
    if let Some(shim_dir) = &args.shim_dir {
        options.shim_dir = Some(expand(shim_dir));
    }
    if args.no_minify {
        options.minify = false;
    }
    if let Some(target) = &args.target {
        options.target = target.clone();
    }

    if options.src_dir.as_os_str().is_empty() {
        bail!("No source directory given. Pass --src-dir or set \"srcDir\" in the config file");
    }
    Ok(options)
}

fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = Args::parse();

    let options = resolve_options(&args)?;
    let bundler = MonacoBundler::new(options)?;
    let report = prepare(&bundler)
        .with_context(|| format!("Failed to prepare {}", bundler.src_dir().display()))?;

    println!(
        "Prepared monaco-editor {}: {} modules, {} rewritten, {} assets, {} externals",
        bundler.version(),
        report.modules,
        report.rewritten,
        report.assets,
        report.externals
    );
    println!("Manifest written to {}", report.manifest_path.display());
    Ok(())
}
