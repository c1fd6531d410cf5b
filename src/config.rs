//! Command line and environment configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use floorplan_core::default_storage_dir;
use floorplan_geometry::Scale;

/// Shared floor plan layout over iroh
#[derive(Parser, Debug)]
#[command(name = "floorplan")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Own the layout and accept clients
    Serve {
        /// Directory holding areas.json and boxes.json
        #[arg(long, env = "FLOORPLAN_DATA_DIR", value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },

    /// Join a running server
    Join {
        /// Ticket printed by `floorplan serve`
        #[arg(env = "FLOORPLAN_TICKET", value_name = "TICKET")]
        ticket: String,

        /// Pixels per meter for sizes typed in meters
        #[arg(long, env = "FLOORPLAN_SCALE", value_parser = parse_scale)]
        scale: Option<Scale>,
    },

    /// Copy the persisted layout files somewhere else
    Export {
        /// Destination directory for both files
        #[arg(long, value_name = "DIR", required_unless_present = "download")]
        out: Option<PathBuf>,

        /// Write one file to stdout, e.g. `/download/areas.json`
        #[arg(long, value_name = "PATH", conflicts_with = "out")]
        download: Option<String>,

        #[arg(long, env = "FLOORPLAN_DATA_DIR", value_name = "DIR")]
        data_dir: Option<PathBuf>,
    },
}

/// Resolve the data directory, falling back to the per-user default
pub fn data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(default_storage_dir)
}

fn parse_scale(s: &str) -> Result<Scale, String> {
    let value: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("`{s}` is not a number"))?;
    Scale::new(value).ok_or_else(|| format!("scale must be positive, got {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_must_be_positive() {
        assert_eq!(parse_scale("40").unwrap().pixels_per_meter(), 40.0);
        assert!(parse_scale("0").is_err());
        assert!(parse_scale("-3").is_err());
        assert!(parse_scale("fifty").is_err());
    }

    #[test]
    fn join_takes_a_ticket_and_optional_scale() {
        let args = Args::try_parse_from(["floorplan", "-v", "join", "floorplan1abc", "--scale", "25"])
            .unwrap();
        assert!(args.verbose);
        match args.command {
            Command::Join { ticket, scale } => {
                assert_eq!(ticket, "floorplan1abc");
                assert_eq!(scale, Scale::new(25.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn explicit_data_dir_wins() {
        let dir = PathBuf::from("/tmp/layout");
        assert_eq!(data_dir(Some(dir.clone())), dir);
        assert_eq!(data_dir(None), default_storage_dir());
    }

    #[test]
    fn export_takes_out_or_download() {
        assert!(Args::try_parse_from(["floorplan", "export"]).is_err());
        assert!(
            Args::try_parse_from(["floorplan", "export", "--out", "a", "--download", "/download/areas.json"])
                .is_err()
        );

        let args = Args::try_parse_from(["floorplan", "export", "--download", "/download/boxes.json"])
            .unwrap();
        match args.command {
            Command::Export { out, download, .. } => {
                assert_eq!(out, None);
                assert_eq!(download.as_deref(), Some("/download/boxes.json"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
