//! Bridge lifecycle: activate, run, deactivate

use crate::config::BridgeConfig;
use crate::error::Result;
use crate::listener::DiagnosisListener;
use crate::navigation::Navigator;
use crate::surface::EditingSurface;

/// An activated bridge owning its connection and navigator
pub struct Bridge<S> {
    listener: DiagnosisListener,
    navigator: Navigator<S>,
}

impl<S: EditingSurface> Bridge<S> {
    /// Validate the config, connect the listener and pair it with `surface`
    pub async fn activate(config: &BridgeConfig, surface: S) -> Result<Self> {
        config.validate()?;
        let listener = DiagnosisListener::connect(&config.endpoint, config.recipient.clone()).await?;
        log::info!(
            "Listener connected to {} as {}",
            config.endpoint,
            config.recipient
        );

        Ok(Self {
            listener,
            navigator: Navigator::from_config(surface, config),
        })
    }

    /// Handle events until the channel closes
    pub async fn run(&mut self) {
        self.listener.run(&mut self.navigator).await;
    }

    /// Nothing to clean up; the connection closes when dropped
    pub fn deactivate(self) {
        log::debug!("Bridge deactivated");
    }
}
