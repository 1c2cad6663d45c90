//! Fire-and-forget push of the board to the local broadcast overlay.

use crate::dto::overlay::OverlayState;

#[cfg(feature = "overlay-push")]
mod http {
    use std::{sync::Arc, time::Duration};

    use tracing::{debug, warn};

    use crate::dto::overlay::OverlayState;

    const PUSH_TIMEOUT: Duration = Duration::from_secs(2);

    #[derive(Clone)]
    pub struct OverlayTarget {
        client: reqwest::Client,
        endpoint: Arc<str>,
    }

    impl OverlayTarget {
        pub fn connect(endpoint: &str) -> Option<Self> {
            match reqwest::Client::builder().timeout(PUSH_TIMEOUT).build() {
                Ok(client) => Some(Self {
                    client,
                    endpoint: Arc::from(endpoint),
                }),
                Err(err) => {
                    warn!(error = %err, "failed to build overlay client; overlay push disabled");
                    None
                }
            }
        }

        pub fn endpoint(&self) -> &str {
            &self.endpoint
        }

        pub fn push(&self, body: OverlayState) {
            let target = self.clone();
            tokio::spawn(async move {
                let result = target
                    .client
                    .post(target.endpoint.as_ref())
                    .json(&body)
                    .send()
                    .await;
                if let Err(err) = result {
                    debug!(endpoint = %target.endpoint, error = %err, "overlay push failed");
                }
            });
        }
    }
}

/// Sends [`OverlayState`] bodies to the configured overlay endpoint.
///
/// Built without the `overlay-push` feature, or without an endpoint, every
/// publish is a no-op.
#[derive(Clone, Default)]
pub struct OverlayPublisher {
    #[cfg(feature = "overlay-push")]
    target: Option<http::OverlayTarget>,
}

impl OverlayPublisher {
    /// Publisher for `endpoint`; `None` disables the push.
    pub fn new(endpoint: Option<&str>) -> Self {
        #[cfg(feature = "overlay-push")]
        {
            Self {
                target: endpoint.and_then(http::OverlayTarget::connect),
            }
        }

        #[cfg(not(feature = "overlay-push"))]
        {
            if let Some(endpoint) = endpoint {
                tracing::debug!(endpoint, "overlay-push feature disabled; ignoring endpoint");
            }
            Self {}
        }
    }

    /// Endpoint receiving pushes, when enabled.
    pub fn endpoint(&self) -> Option<&str> {
        #[cfg(feature = "overlay-push")]
        {
            self.target.as_ref().map(http::OverlayTarget::endpoint)
        }

        #[cfg(not(feature = "overlay-push"))]
        {
            None
        }
    }

    /// Queue a push of `body`. Delivery failures are only logged.
    pub fn publish(&self, body: OverlayState) {
        #[cfg(feature = "overlay-push")]
        if let Some(target) = &self.target {
            target.push(body);
        }

        #[cfg(not(feature = "overlay-push"))]
        let _ = body;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::board::Scoreboard;

    #[test]
    fn publisher_without_endpoint_is_inert() {
        let publisher = OverlayPublisher::new(None);
        assert_eq!(publisher.endpoint(), None);
        // No runtime here: a disabled publisher must not spawn.
        publisher.publish(OverlayState::from(&Scoreboard::new()));
    }

    #[cfg(feature = "overlay-push")]
    #[test]
    fn publisher_keeps_configured_endpoint() {
        let publisher = OverlayPublisher::new(Some("http://127.0.0.1:8765/state"));
        assert_eq!(publisher.endpoint(), Some("http://127.0.0.1:8765/state"));
    }
}
