use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{error::FetchError, model::WeatherResult, query::CityQuery};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Success(WeatherResult),
    Failed(FetchError),
}

/// Handle for one in-flight request, issued by [`RetryCoordinator`].
#[derive(Debug, Clone)]
pub struct Ticket {
    generation: u64,
    query: CityQuery,
    cancel: CancellationToken,
}

impl Ticket {
    pub fn query(&self) -> &CityQuery {
        &self.query
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Owns the request state and retry counter and applies transitions.
///
/// Only the most recently issued ticket may complete; a new submit cancels
/// the previous in-flight ticket, and a ticket completes at most once.
#[derive(Debug, Default)]
pub struct RetryCoordinator {
    state: RequestState,
    retries: u32,
    query: Option<CityQuery>,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

impl RetryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retries
    }

    pub fn last_query(&self) -> Option<&CityQuery> {
        self.query.as_ref()
    }

    /// Starts a lookup for a newly accepted query, from any state.
    pub fn submit(&mut self, query: CityQuery) -> Ticket {
        self.retries = 0;
        self.query = Some(query.clone());
        self.begin(query)
    }

    /// Re-issues the last query. Only allowed from `Failed`.
    pub fn retry(&mut self) -> Option<Ticket> {
        if !matches!(self.state, RequestState::Failed(_)) {
            return None;
        }
        let query = self.query.clone()?;
        self.retries += 1;
        Some(self.begin(query))
    }

    /// Applies a fetch outcome. Returns `false` if the ticket was superseded
    /// or already completed, in which case nothing changes.
    pub fn complete(
        &mut self,
        ticket: &Ticket,
        outcome: Result<WeatherResult, FetchError>,
    ) -> bool {
        if ticket.generation != self.generation || !matches!(self.state, RequestState::Loading) {
            debug!(city = %ticket.query, "discarding stale weather result");
            return false;
        }

        self.in_flight = None;
        self.state = match outcome {
            Ok(result) => {
                self.retries = 0;
                RequestState::Success(result)
            }
            Err(err) => RequestState::Failed(err),
        };
        true
    }

    fn begin(&mut self, query: CityQuery) -> Ticket {
        if let Some(previous) = self.in_flight.take() {
            previous.cancel();
        }

        self.generation += 1;
        let cancel = CancellationToken::new();
        self.in_flight = Some(cancel.clone());
        self.state = RequestState::Loading;

        Ticket { generation: self.generation, query, cancel }
    }
}
