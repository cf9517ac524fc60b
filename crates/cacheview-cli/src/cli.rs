use std::path::PathBuf;

use cacheview_core::style::Color;
use clap::Parser;

/// Fetch a remote image, showing download progress, and optionally save it.
#[derive(Debug, Parser)]
#[command(name = "cacheview", version, about)]
pub struct Args {
    /// Image URL to fetch.
    pub url: String,

    /// Image shown until the download finishes, or kept if it fails.
    #[arg(long)]
    pub placeholder: Option<PathBuf>,

    /// Where to write the decoded image. Format follows the extension.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Progress ring stroke width.
    #[arg(long)]
    pub progress_width: Option<f64>,

    /// Progress ring color as #rrggbb or #rrggbbaa.
    #[arg(long, value_parser = parse_color)]
    pub progress_color: Option<Color>,

    #[arg(long)]
    pub border_width: Option<f64>,

    /// Border color as #rrggbb or #rrggbbaa.
    #[arg(long, value_parser = parse_color)]
    pub border_color: Option<Color>,

    /// Do not show download progress.
    #[arg(long)]
    pub no_loading: bool,

    /// Config file to use instead of the user config.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write logs to daily files in this directory.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

fn parse_color(raw: &str) -> Result<Color, String> {
    Color::from_hex(raw).ok_or_else(|| format!("invalid color `{raw}`, expected #rrggbb[aa]"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parses_full_invocation() {
        let args = Args::try_parse_from([
            "cacheview",
            "https://example.com/a.png",
            "--output",
            "a.png",
            "--progress-width",
            "3",
            "--progress-color",
            "#ff0000",
            "--border-width",
            "1.5",
            "--no-loading",
        ])
        .unwrap();

        assert_eq!(args.url, "https://example.com/a.png");
        assert_eq!(args.output, Some(PathBuf::from("a.png")));
        assert_eq!(args.progress_width, Some(3.0));
        assert_eq!(args.progress_color, Some(Color::rgba(1.0, 0.0, 0.0, 1.0)));
        assert_eq!(args.border_width, Some(1.5));
        assert!(args.border_color.is_none());
        assert!(args.no_loading);
    }

    #[test]
    fn test_rejects_bad_color() {
        let err = Args::try_parse_from(["cacheview", "https://x", "--border-color", "red"]);
        assert!(err.is_err());
    }
}
