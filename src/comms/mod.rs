//! Presentation channels: the single question page and its console twin.
//!
//! Each channel implements [`Channel`] and captures its shared
//! [`Arc<AskState>`] at construction time. [`build`] picks the configured
//! channel; [`run`] drives it until it finishes or `shutdown` is cancelled.

mod state;
#[cfg(feature = "channel-console")]
pub mod console;
#[cfg(feature = "channel-web")]
pub mod web;

pub use state::{AskState, Display};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{ChannelKind, Config};
use crate::error::AppError;

/// A boxed, owned future returned by [`Channel::run`].
pub type ChannelFuture = Pin<Box<dyn Future<Output = Result<(), AppError>> + Send + 'static>>;

/// A self-contained front end.
///
/// [`Channel::run`] is called once and should return when `shutdown` is
/// cancelled or the channel's input is exhausted.
pub trait Channel: Send + 'static {
    /// Stable identifier used in log messages.
    fn id(&self) -> &str;

    /// Consume the channel and return its run-loop as a boxed future.
    fn run(self: Box<Self>, shutdown: CancellationToken) -> ChannelFuture;
}

/// Construct the channel named by `config.ui.channel`.
pub fn build(config: &Config, state: Arc<AskState>) -> Result<Box<dyn Channel>, AppError> {
    match config.ui.channel {
        #[cfg(feature = "channel-web")]
        ChannelKind::Web => Ok(Box::new(web::WebChannel::new("web0", config.ui.bind.clone(), state))),
        #[cfg(feature = "channel-console")]
        ChannelKind::Console => Ok(Box::new(console::ConsoleChannel::new("console0", state))),
        #[allow(unreachable_patterns)]
        other => Err(AppError::Config(format!(
            "channel {other:?} is not compiled into this build"
        ))),
    }
}

/// Run `channel` to completion. Errors are logged and returned.
pub async fn run(channel: Box<dyn Channel>, shutdown: CancellationToken) -> Result<(), AppError> {
    let id = channel.id().to_string();
    info!(channel_id = %id, "channel starting");
    let result = channel.run(shutdown).await;
    match &result {
        Ok(()) => info!(channel_id = %id, "channel exited"),
        Err(e) => error!(channel_id = %id, error = %e, "channel failed"),
    }
    result
}
