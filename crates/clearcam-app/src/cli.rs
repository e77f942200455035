//! Command-line interface.
//!
//!   clearcam compose --frame frame.png --shapes shapes.json --output out.png
//!   clearcam save --frame frame.png --shapes shapes.json --video JA_2.mp4 --time 12.4 --label dirty --sublabel Blood

use crate::app::{App, AppConfig, AppError, ComposeRequest, SaveRequest};
use clap::{Parser, Subcommand};
use clearcam_core::labels::PrimaryLabel;
use kurbo::Size;
use std::path::PathBuf;
use std::process::ExitCode;

/// ClearCam headless frame annotator.
#[derive(Parser, Debug)]
#[command(
    name = "clearcam",
    version,
    about = "Flatten frame annotations and save labelled frames"
)]
pub struct CliArgs {
    /// App configuration file (defaults to the platform config dir).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Draw a shapes file onto a frame image and write a PNG.
    Compose {
        /// Frame image (PNG or JPEG).
        #[arg(long, value_name = "IMAGE")]
        frame: PathBuf,
        /// JSON array of shapes in display-canvas coordinates.
        #[arg(long, value_name = "JSON")]
        shapes: PathBuf,
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
        /// Display canvas the shapes were drawn on, as WxH.
        #[arg(long, value_parser = parse_display, value_name = "WxH")]
        display: Option<Size>,
    },
    /// Label a frame, export it and print the saved record.
    Save {
        #[arg(long, value_name = "IMAGE")]
        frame: PathBuf,
        #[arg(long, value_name = "JSON")]
        shapes: PathBuf,
        /// Video name, used for the upload path.
        #[arg(long)]
        video: String,
        /// Frame time in seconds.
        #[arg(long)]
        time: f64,
        #[arg(long, default_value = "clean")]
        label: PrimaryLabel,
        /// Contamination sublabel; repeat for several. Requires --label dirty.
        #[arg(long = "sublabel", value_name = "NAME")]
        sublabels: Vec<String>,
        #[arg(long, value_name = "DIR")]
        upload_dir: Option<PathBuf>,
        #[arg(long, value_parser = parse_display, value_name = "WxH")]
        display: Option<Size>,
    },
}

/// Parse a `WxH` size such as `960x540`.
pub fn parse_display(s: &str) -> Result<Size, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
    let w: f64 = w.trim().parse().map_err(|_| format!("bad width in '{s}'"))?;
    let h: f64 = h.trim().parse().map_err(|_| format!("bad height in '{s}'"))?;
    if !(w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite()) {
        return Err(format!("size must be positive, got '{s}'"));
    }
    Ok(Size::new(w, h))
}

/// Run a parsed command line and return the process exit code.
pub fn run(args: CliArgs) -> ExitCode {
    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn execute(args: CliArgs) -> Result<(), AppError> {
    let config = AppConfig::load(args.config.as_deref())?;
    let app = App::new(config)?;

    match args.command {
        Command::Compose {
            frame,
            shapes,
            output,
            display,
        } => {
            let (width, height) = app.compose(&ComposeRequest {
                frame,
                shapes,
                output: output.clone(),
                display,
            })?;
            println!("{} ({width}x{height})", output.display());
        }
        Command::Save {
            frame,
            shapes,
            video,
            time,
            label,
            sublabels,
            upload_dir,
            display,
        } => {
            let report = app.save(&SaveRequest {
                frame,
                shapes,
                video,
                time,
                label,
                sublabels,
                display,
                upload_dir,
            })?;
            if let Some(message) = report.status.message() {
                eprintln!("{message}");
            }
            let json = report
                .record
                .to_json()
                .map_err(|e| AppError::Export(e.to_string()))?;
            println!("{json}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display() {
        assert_eq!(parse_display("960x540"), Ok(Size::new(960.0, 540.0)));
        assert_eq!(parse_display("800X450"), Ok(Size::new(800.0, 450.0)));
        assert!(parse_display("960").is_err());
        assert!(parse_display("0x540").is_err());
        assert!(parse_display("ax540").is_err());
    }

    #[test]
    fn test_parse_save_command() {
        let args = CliArgs::try_parse_from([
            "clearcam", "save", "--frame", "f.png", "--shapes", "s.json", "--video", "JA_2.mp4",
            "--time", "12.4", "--label", "dirty", "--sublabel", "Blood", "--sublabel", "Smoke",
        ])
        .unwrap();
        let Command::Save {
            label,
            sublabels,
            time,
            display,
            ..
        } = args.command
        else {
            panic!("expected save");
        };
        assert_eq!(label, PrimaryLabel::Dirty);
        assert_eq!(sublabels, vec!["Blood".to_string(), "Smoke".to_string()]);
        assert_eq!(time, 12.4);
        assert_eq!(display, None);
    }

    #[test]
    fn test_parse_compose_command() {
        let args = CliArgs::try_parse_from([
            "clearcam", "compose", "--frame", "f.png", "--shapes", "s.json", "-o", "out.png",
            "--display", "800x450",
        ])
        .unwrap();
        assert!(matches!(
            args.command,
            Command::Compose { display: Some(size), .. } if size == Size::new(800.0, 450.0)
        ));
        assert!(CliArgs::try_parse_from(["clearcam", "save", "--label", "muddy"]).is_err());
    }
}
