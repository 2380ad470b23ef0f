use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use super::local::LocalRuleResponder;
use super::remote::RemoteModelResponder;
use super::traits::{ChatReply, QueryRequest, QueryResponder};
use crate::circuit_breaker::{BreakerState, CircuitBreaker};
use crate::config::{BreakerConfig, RemoteModelConfig};
use crate::error::AppError;

/// Slack on top of the remote request timeout before the wrapper gives up.
const TIMEOUT_GRACE: Duration = Duration::from_secs(2);

/// Wraps a primary responder and answers locally whenever it fails.
///
/// The primary is guarded by a [`CircuitBreaker`]: after repeated failures
/// it is skipped entirely until the cooldown elapses. Failures are logged and
/// never reach the caller.
pub struct FallbackResponder {
    primary: Arc<dyn QueryResponder>,
    local: LocalRuleResponder,
    breaker: Mutex<CircuitBreaker>,
    call_timeout: Duration,
}

impl FallbackResponder {
    pub fn new(
        primary: Arc<dyn QueryResponder>,
        breaker: &BreakerConfig,
        call_timeout: Duration,
    ) -> Self {
        Self {
            primary,
            local: LocalRuleResponder::default(),
            breaker: Mutex::new(CircuitBreaker::new(breaker)),
            call_timeout,
        }
    }

    /// Remote model in front of the local rule engine.
    pub fn with_remote(config: RemoteModelConfig, breaker: &BreakerConfig) -> Self {
        let call_timeout = config.request_timeout() + TIMEOUT_GRACE;
        Self::new(Arc::new(RemoteModelResponder::new(config)), breaker, call_timeout)
    }

    pub fn with_local(mut self, local: LocalRuleResponder) -> Self {
        self.local = local;
        self
    }

    pub async fn breaker_state(&self) -> BreakerState {
        self.breaker.lock().await.state()
    }

    /// Always produces a reply: the primary's when it succeeds in time,
    /// otherwise the local one.
    #[instrument(skip(self, request), fields(primary = self.primary.name()))]
    pub async fn answer(&self, request: &QueryRequest) -> ChatReply {
        if !self.breaker.lock().await.allow() {
            info!("Circuit open, answering locally");
            return self.local.reply(request);
        }

        let outcome = match timeout(self.call_timeout, self.primary.respond(request)).await {
            Ok(result) => result,
            Err(elapsed) => Err(AppError::from(elapsed)),
        };

        match outcome {
            Ok(reply) => {
                self.breaker.lock().await.record_success();
                reply
            }
            Err(e) => {
                warn!(error = %e, "Primary responder failed, falling back to local rules");
                self.breaker.lock().await.record_failure();
                self.local.reply(request)
            }
        }
    }
}

#[async_trait]
impl QueryResponder for FallbackResponder {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn respond(&self, request: &QueryRequest) -> Result<ChatReply, AppError> {
        Ok(self.answer(request).await)
    }
}
