//! Cooperative driver that pumps fetch plans through a transport.
//!
//! The binder itself never performs I/O; it hands back [`FetchPlan`]s. This
//! module supplies the transport seam, an HTTP implementation over
//! [`ConsoleClient`], and a loop that re-binds until no plans remain.
//! There is no true network cancellation: a plan that becomes irrelevant is
//! simply discarded when its stale ticket fails to settle.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use galley_api::{ConsoleClient, Error};

use crate::{
    binder::{BindOutcome, DependentFetchBinder},
    engine::FetchPlan,
};

/// Executes one planned fetch. Timeouts and network failures surface as
/// ordinary errors with no special handling; the engine captures them into
/// rejected states.
#[async_trait]
pub trait FetchTransport: Send + Sync {
    async fn fetch(&self, plan: &FetchPlan) -> Result<Value, Error>;
}

/// Transport backed by the console REST client.
pub struct HttpTransport {
    client: ConsoleClient,
}

impl HttpTransport {
    pub fn new(client: ConsoleClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FetchTransport for HttpTransport {
    async fn fetch(&self, plan: &FetchPlan) -> Result<Value, Error> {
        debug!(key = %plan.key, url = %plan.url, "dispatching planned fetch");
        self.client.get_raw(&plan.url, &plan.params).await
    }
}

/// Bind, dispatch, and settle until the binding reaches quiescence.
///
/// Each pass settles every plan the evaluation produced, then re-binds so
/// that newly fulfilled dependencies can expand their continuations. The
/// continuation depth limit bounds the number of passes; a configuration
/// error from the binder aborts loudly.
pub async fn run_until_settled(
    binder: &mut DependentFetchBinder,
    inputs: &Value,
    transport: &dyn FetchTransport,
) -> Result<BindOutcome, Error> {
    loop {
        let outcome = binder.bind(inputs)?;
        if outcome.plans.is_empty() {
            return Ok(outcome);
        }

        for plan in &outcome.plans {
            let result = transport.fetch(plan).await.map_err(|error| error.to_string());
            binder.settle(&plan.key, plan.ticket, result);
        }
    }
}

/// Dispatch and settle a set of already-planned fetches, used after
/// [`DependentFetchBinder::force_refresh`].
pub async fn settle_plans(binder: &mut DependentFetchBinder, plans: &[FetchPlan], transport: &dyn FetchTransport) {
    for plan in plans {
        let result = transport.fetch(plan).await.map_err(|error| error.to_string());
        binder.settle(&plan.key, plan.ticket, result);
    }
}
