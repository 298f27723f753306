pub mod annotation;
mod config;
pub mod error;
pub mod geometry;
pub mod history;
pub mod logging;
pub mod session;
pub mod transform;

pub use error::{AppError, AppResult};
pub use history::{EditHistory, HistoryControls, HistoryError};
pub use session::SessionParameters;

/// Session record prepared for the host before any warp is opened.
#[derive(Debug, Clone)]
pub struct SessionLaunch {
    pub params: SessionParameters,
    /// Started by an external caller; the host shows the single-purpose layout.
    pub reduced_mode: bool,
}

/// Entrypoint used by hosts and the CLI binary.
pub fn run() -> AppResult<SessionLaunch> {
    logging::init();
    tracing::info!("starting warpdrive");

    let app_config = config::load_app_config();
    let mut params = SessionParameters::with_tool_defaults(&app_config.tool_defaults);
    let reduced_mode = session::BootstrapArgs::from_env()
        .map(|args| args.apply(&mut params))
        .unwrap_or(false);

    params.smudge_settings()?;
    params.draw_settings()?;
    params.smooth_settings()?;

    tracing::info!(reduced_mode, "session parameters ready");
    Ok(SessionLaunch {
        params,
        reduced_mode,
    })
}
