use std::process;

use anyhow::{Context, Result};
use archivist_upload::{NoProgress, ProgressReporter, S3Store, Uploader};
use clap::Parser;
use tracing::error;

mod cli;
mod logging;
mod report;

use cli::Cli;
use report::{print_result, ConsoleProgress};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init() {
        eprintln!("{:#}", e);
    }

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{:#}", e);
            process::exit(1);
        }
    }
}

/// Upload every file in turn; `Ok(false)` if any of them failed
async fn run(cli: Cli) -> Result<bool> {
    let config = cli.upload_config().context("invalid configuration")?;
    let store = S3Store::from_config(&config)
        .await
        .context("failed to create storage client")?;
    let uploader = Uploader::new(store, config).context("failed to create uploader")?;

    let mut all_succeeded = true;
    for path in &cli.files {
        // Missing files get only the "File not found" line from the result
        if !cli.json && path.exists() {
            println!(
                "Uploading: {} -> s3://{}/{}",
                path.display(),
                uploader.config().container,
                uploader.object_key(path)
            );
        }

        let progress: Box<dyn ProgressReporter> = if cli.json {
            Box::new(NoProgress)
        } else {
            Box::new(ConsoleProgress::new())
        };
        let result = uploader
            .upload_path_with_progress(path, progress.as_ref())
            .await;

        print_result(&result, cli.json)?;
        all_succeeded &= result.success;
    }

    Ok(all_succeeded)
}
