use std::time::Duration;

use tracing::info;

use crate::{
    client::{WeatherSource, fetch_weather},
    error::ValidationError,
    query::CityQuery,
    state::{RequestState, RetryCoordinator, Ticket},
};

/// Drives lookups through a [`RetryCoordinator`]: validate, fetch, commit.
#[derive(Debug)]
pub struct WeatherSession<S> {
    source: S,
    timeout: Duration,
    coordinator: RetryCoordinator,
}

impl<S: WeatherSource> WeatherSession<S> {
    pub fn new(source: S, timeout: Duration) -> Self {
        Self { source, timeout, coordinator: RetryCoordinator::new() }
    }

    pub fn state(&self) -> &RequestState {
        self.coordinator.state()
    }

    pub fn retry_count(&self) -> u32 {
        self.coordinator.retry_count()
    }

    pub fn last_query(&self) -> Option<&CityQuery> {
        self.coordinator.last_query()
    }

    /// Validates `raw` and looks it up. Invalid input leaves the state and
    /// the network untouched.
    pub async fn submit(&mut self, raw: &str) -> Result<&RequestState, ValidationError> {
        let query = CityQuery::parse(raw)?;
        info!(city = %query, "looking up weather");

        let ticket = self.coordinator.submit(query);
        self.run(ticket).await;
        Ok(self.coordinator.state())
    }

    /// Repeats the last query after a failure. `None` when there is nothing
    /// to retry.
    pub async fn retry(&mut self) -> Option<&RequestState> {
        let ticket = self.coordinator.retry()?;
        info!(city = %ticket.query(), attempt = self.coordinator.retry_count(), "retrying weather lookup");

        self.run(ticket).await;
        Some(self.coordinator.state())
    }

    async fn run(&mut self, ticket: Ticket) {
        let outcome =
            fetch_weather(&self.source, ticket.query(), self.timeout, ticket.cancel_token()).await;
        self.coordinator.complete(&ticket, outcome);
    }
}
