mod config;
mod logging;
mod repl;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use floorplan_core::LayoutDocument;
use floorplan_sync::{start_client_thread, start_server};

use config::{Args, Command};

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match args.command {
        Command::Serve { data_dir } => rt.block_on(serve(config::data_dir(data_dir))),
        Command::Join { ticket, scale } => {
            // Network runs on its own thread; the prompt loop stays here
            let handle = start_client_thread(&ticket)?;
            rt.block_on(repl::run(handle, scale.unwrap_or_default()))
        }
        Command::Export {
            out,
            download,
            data_dir,
        } => {
            let data_dir = config::data_dir(data_dir);
            match (out, download) {
                (_, Some(request)) => {
                    let mut stdout = std::io::stdout().lock();
                    floorplan_export::download_to(&data_dir, &request, &mut stdout)?;
                    Ok(())
                }
                (Some(out), None) => export(&data_dir, &out),
                (None, None) => anyhow::bail!("Nothing to export: pass --out or --download"),
            }
        }
    }
}

async fn serve(data_dir: PathBuf) -> Result<()> {
    let mut doc = LayoutDocument::load(&data_dir)?;
    // Rewrite files that needed backfilling
    if doc.is_dirty() {
        doc.save()?;
    }
    tracing::info!(
        dir = %data_dir.display(),
        areas = doc.areas().len(),
        boxes = doc.boxes().len(),
        "layout loaded"
    );

    let server = start_server(doc).await?;
    println!("Session ticket: {}", server.ticket());
    println!("Join with: floorplan join {}", server.ticket());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    tracing::info!(clients = server.channel().connection_count(), "shutting down");
    server.shutdown().await
}

fn export(data_dir: &Path, out: &Path) -> Result<()> {
    for path in floorplan_export::export_to(data_dir, out)? {
        println!("{}", path.display());
    }
    Ok(())
}
