mod cli;
mod logging;
mod surface;

use std::cell::RefCell;
use std::process::ExitCode;
use std::rc::Rc;

use cacheview_core::config::AppConfig;
use cacheview_core::error::ConfigError;
use cacheview_core::{decode, Image, ImageLoadController, LoadError, LoadRequest};
use cacheview_net::{build_client, drive, FetchError, HttpTransport};
use clap::Parser;

use crate::cli::Args;
use crate::surface::{TerminalSurface, BAR_WIDTH, VIEW_BOUNDS};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to set up HTTP client: {0}")]
    Client(#[from] FetchError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("failed to save image: {0}")]
    Save(#[from] image::ImageError),

    #[error("download ended without a result")]
    NoResult,

    #[error("interrupted")]
    Interrupted,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _log_guard = logging::init(args.log_dir.as_deref());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    let mut view = config.view_config();
    if args.no_loading {
        view.show_loading = false;
    }

    let http = build_client(&config.network)?;
    let (transport, mut events) = HttpTransport::channel(http);
    let surface = TerminalSurface::new(BAR_WIDTH, view.ring_geometry(VIEW_BOUNDS));
    let mut controller = ImageLoadController::with_config(transport, surface, view);

    let outcome: Rc<RefCell<Option<Result<Image, LoadError>>>> = Rc::default();
    let sink = Rc::clone(&outcome);
    let mut request = LoadRequest::new(args.url.as_str())
        .on_complete(move |result| *sink.borrow_mut() = Some(result));

    if let Some(path) = &args.placeholder {
        request = request.placeholder(decode::open(path)?);
    }
    if let Some(color) = args.progress_color {
        request = request.progress_color(color);
    }
    if let Some(width) = args.progress_width {
        request = request.progress_line_width(width);
    }
    if args.border_color.is_some() || args.border_width.is_some() {
        let width = args
            .border_width
            .unwrap_or(controller.config().border.width);
        request = request.border(args.border_color, width);
    }

    controller.load(request);

    let interrupted = tokio::select! {
        _ = drive(&mut controller, &mut events) => false,
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        controller.cancel();
        return Err(CliError::Interrupted);
    }

    let result = outcome.borrow_mut().take().ok_or(CliError::NoResult)?;
    let image = result?;

    if let Some(path) = &args.output {
        image.as_dynamic().save(path)?;
        tracing::info!(path = %path.display(), "Saved image");
    }
    Ok(())
}
