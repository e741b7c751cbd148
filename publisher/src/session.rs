use std::future::Future;
use std::time::Duration;

use tracing::{error, info};

use crate::errors::{Error, Result};
use crate::model::Reading;
use crate::mqtt::BrokerLink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    ConnectFailed,
    Publishing,
    Published,
    PublishFailed,
}

/// Upper bounds for the two blocking steps. `None` waits indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Option<Duration>,
    pub publish: Option<Duration>,
}

impl Timeouts {
    pub const UNBOUNDED: Timeouts = Timeouts {
        connect: None,
        publish: None,
    };

    /// Zero seconds means no bound.
    pub fn from_secs(connect: u64, publish: u64) -> Self {
        let bound = |secs| (secs > 0).then(|| Duration::from_secs(secs));
        Self {
            connect: bound(connect),
            publish: bound(publish),
        }
    }
}

/// One connect-then-publish exchange. Not reusable: once a step has
/// resolved the session only moves forward.
pub struct PublishSession<L> {
    link: L,
    state: SessionState,
    timeouts: Timeouts,
}

impl<L: BrokerLink> PublishSession<L> {
    pub fn new(link: L, timeouts: Timeouts) -> Self {
        Self {
            link,
            state: SessionState::Idle,
            timeouts,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub async fn connect(&mut self) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(Error::InvalidState {
                operation: "connect",
                state: self.state,
            });
        }

        self.state = SessionState::Connecting;
        let result = bounded("connect", self.timeouts.connect, self.link.connect()).await;
        self.state = if result.is_ok() {
            SessionState::Connected
        } else {
            SessionState::ConnectFailed
        };

        result
    }

    pub async fn publish(&mut self, topic: &str, reading: &Reading) -> Result<()> {
        if self.state != SessionState::Connected {
            return Err(Error::InvalidState {
                operation: "publish",
                state: self.state,
            });
        }

        self.state = SessionState::Publishing;
        let payload = reading.payload();
        let result = bounded(
            "publish",
            self.timeouts.publish,
            self.link.publish(topic, payload),
        )
        .await;
        self.state = if result.is_ok() {
            SessionState::Published
        } else {
            SessionState::PublishFailed
        };

        result
    }

    /// Connects, then publishes `reading` once. Publish is never attempted
    /// after a failed connect, and neither step is retried.
    pub async fn deliver(mut self, topic: &str, reading: &Reading) -> Result<()> {
        if let Err(e) = self.connect().await {
            error!(state = ?self.state(), "Error connecting MQTT client: {}", e);
            return Err(e);
        }

        if let Err(e) = self.publish(topic, reading).await {
            error!(state = ?self.state(), "Error publishing message: {}", e);
            return Err(e);
        }

        info!("Published {} on {}", reading.payload(), topic);
        Ok(())
    }
}

async fn bounded<F>(stage: &'static str, limit: Option<Duration>, fut: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    match limit {
        Some(after) => tokio::time::timeout(after, fut)
            .await
            .map_err(|_| Error::Timeout { stage, after })?,
        None => fut.await,
    }
}
