use cruisefeed_core::{Config, FeedPipeline, SanitizedConfig, SessionBroker};

/// Shared application state
pub struct AppState {
    config: Config,
    pipeline: FeedPipeline,
    broker: SessionBroker,
}

impl AppState {
    pub fn new(config: Config, pipeline: FeedPipeline, broker: SessionBroker) -> Self {
        Self {
            config,
            pipeline,
            broker,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn pipeline(&self) -> &FeedPipeline {
        &self.pipeline
    }

    pub fn broker(&self) -> &SessionBroker {
        &self.broker
    }
}
