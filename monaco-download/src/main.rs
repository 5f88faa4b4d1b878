use anyhow::Context;
use clap::Parser;
use log::warn;
use monaco_bundle_rs::download::{download_monaco, DownloadOptions, DownloadProgress};
use monaco_bundle_rs::npm::{NpmRegistry, NPM_REGISTRY_URL};
use monaco_bundle_rs::progress::{
    format_size, gray, green, progress_bar, render_template, write_progress_line, ProgressValue,
    DEFAULT_BAR_WIDTH,
};
use std::collections::HashMap;
use std::path::PathBuf;

const PROGRESS_TEMPLATE: &str = "{title}: {progressBar} {progress} {speed}";

/// monaco-download: Download a published monaco-editor release from the npm registry
#[derive(Parser, Debug)]
#[clap(author, about, long_about = None)]
struct Args {
    /// monaco-editor version or dist-tag to download
    #[clap(short, long, default_value = "latest")]
    pub version: String,

    /// Absolute directory to download into. Defaults to ./tmp
    #[clap(short, long)]
    pub dir: Option<String>,

    /// Replace an existing download of the same version
    #[clap(short, long)]
    pub overwrite: bool,

    /// npm registry to resolve the package from
    #[clap(long, default_value = NPM_REGISTRY_URL)]
    pub registry: String,
}

fn render_progress(progress: &DownloadProgress) -> String {
    let props = HashMap::from([
        ("title", ProgressValue::from("Downloading monaco-editor")),
        (
            "progressBar",
            ProgressValue::from(progress_bar(progress.percent, DEFAULT_BAR_WIDTH)),
        ),
        ("progress", ProgressValue::from(progress.percent)),
        (
            "speed",
            ProgressValue::from(gray(&format!("({}/s)", format_size(progress.speed)))),
        ),
    ]);
    render_template(PROGRESS_TEMPLATE, &props)
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = Args::parse();

    let dir = args
        .dir
        .as_deref()
        .map(|dir| PathBuf::from(shellexpand::tilde(dir.trim()).as_ref()));
    if let Some(dir) = dir.as_ref().filter(|dir| !dir.is_absolute()) {
        warn!(
            "Ignoring relative download dir {}, using ./tmp",
            dir.display()
        );
    }
    let options = DownloadOptions {
        version: Some(args.version),
        dir,
        overwrite: args.overwrite,
    };
    let registry = NpmRegistry::new(&args.registry);

    let mut stdout = std::io::stdout();
    let mut drawn = false;
    let result = download_monaco(&registry, &options, |progress| {
        drawn = true;
        // Best effort; a failed write does not abort the download.
        let _ = write_progress_line(&mut stdout, &render_progress(progress));
    })
    .await;
    if drawn {
        println!();
    }

    let report = result.context("Failed to download monaco-editor")?;
    println!(
        "{}",
        green(&format!(
            "Downloaded monaco-editor {} ({}) to {}",
            report.package.version,
            format_size(report.bytes as f64),
            report.version_dir.display()
        ))
    );
    Ok(())
}
