use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, Url, header::ACCEPT};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::Config,
    error::FetchError,
    model::{RawWeather, WeatherResult},
    query::CityQuery,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can answer a current-weather query for a city.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_current(&self, query: &CityQuery) -> Result<RawWeather, FetchError>;
}

/// OpenWeatherMap current-weather client.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    api_key: String,
    base_url: Url,
    http: Client,
}

impl WeatherClient {
    pub fn new(api_key: String, base_url: Url) -> Self {
        Self::with_http_client(api_key, base_url, Client::new())
    }

    pub fn with_http_client(api_key: String, base_url: Url, http: Client) -> Self {
        Self { api_key, base_url, http }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api.key.expose().to_owned(), config.api.base_url.clone())
    }

    /// `{base}/weather?q=..&appid=..&units=metric`, with the query encoded.
    pub fn request_url(&self, query: &CityQuery) -> Url {
        let mut url = self.base_url.clone();
        let path = format!("{}/weather", url.path().trim_end_matches('/'));
        url.set_path(&path);
        url.query_pairs_mut()
            .clear()
            .append_pair("q", query.as_str())
            .append_pair("appid", &self.api_key)
            .append_pair("units", "metric");
        url
    }
}

#[async_trait]
impl WeatherSource for WeatherClient {
    async fn fetch_current(&self, query: &CityQuery) -> Result<RawWeather, FetchError> {
        let url = self.request_url(query);
        debug!(city = %query, "requesting current weather");

        let res = self
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = res.status();
        if let Some(err) = FetchError::from_status(status.as_u16()) {
            warn!(city = %query, %status, "weather request rejected");
            return Err(err);
        }

        let body = res.text().await.map_err(FetchError::from_transport)?;

        RawWeather::from_body(&body).inspect_err(|err| {
            warn!(city = %query, error = %err, "weather response failed validation");
        })
    }
}

/// Runs one lookup bounded by `timeout` and abortable through `cancel`.
///
/// Whichever of the request, the timer, and the token finishes first decides
/// the outcome; the others are dropped. Both the timer and an abort yield
/// [`FetchError::Timeout`].
pub async fn fetch_weather<S>(
    source: &S,
    query: &CityQuery,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<WeatherResult, FetchError>
where
    S: WeatherSource + ?Sized,
{
    let raw = tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            debug!(city = %query, "weather request aborted");
            return Err(FetchError::Timeout);
        }
        _ = tokio::time::sleep(timeout) => {
            warn!(city = %query, ?timeout, "weather request timed out");
            return Err(FetchError::Timeout);
        }
        res = source.fetch_current(query) => res?,
    };

    Ok(WeatherResult::from(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        sync::oneshot,
    };

    /// Serves one canned HTTP response and reports the request line it saw.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).into_owned();
            let _ = tx.send(request.lines().next().unwrap_or_default().to_owned());

            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        (format!("http://{addr}"), rx)
    }

    fn client(base_url: String) -> WeatherClient {
        let http = Client::builder().no_proxy().build().unwrap();
        WeatherClient::with_http_client("KEY".into(), Url::parse(&base_url).unwrap(), http)
    }

    fn city(name: &str) -> CityQuery {
        CityQuery::parse(name).unwrap()
    }

    #[test]
    fn request_url_shape() {
        let base = Url::parse("https://example.test/data/2.5/").unwrap();
        let c = WeatherClient::new("SECRET".into(), base);
        let url = c.request_url(&city("Coeur d'Alene"));

        assert_eq!(url.path(), "/data/2.5/weather");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("q".into(), "Coeur d'Alene".into()),
                ("appid".into(), "SECRET".into()),
                ("units".into(), "metric".into()),
            ]
        );
        assert!(!url.as_str().contains(' '));
        assert!(!url.as_str().contains('\''));
    }

    #[tokio::test]
    async fn success_body_is_returned() {
        let (base, seen) = serve_once(
            "200 OK",
            r#"{"name":"Seattle","main":{"temp":15},"sys":{"country":"US"},"cod":200}"#,
        )
        .await;

        let raw = client(base).fetch_current(&city("Seattle")).await.unwrap();
        assert_eq!(raw.as_value()["name"], json!("Seattle"));

        let line = seen.await.unwrap();
        assert!(line.starts_with("GET /weather?q=Seattle&appid=KEY&units=metric"), "{line}");
    }

    #[tokio::test]
    async fn http_status_is_classified() {
        let cases = [
            ("404 Not Found", FetchError::CityNotFound),
            ("401 Unauthorized", FetchError::InvalidApiKey),
            ("429 Too Many Requests", FetchError::RateLimited),
            ("502 Bad Gateway", FetchError::ServerError(502)),
            ("418 I'm a teapot", FetchError::UnknownHttpStatus(418)),
        ];

        for (status, expected) in cases {
            let (base, _) = serve_once(status, r#"{"cod":"x","message":"nope"}"#).await;
            let err = client(base).fetch_current(&city("Nowhere")).await.unwrap_err();
            assert_eq!(err, expected, "{status}");
        }
    }

    #[tokio::test]
    async fn malformed_success_body() {
        let (base, _) = serve_once("200 OK", r#"{"message":"ok"}"#).await;
        let err = client(base).fetch_current(&city("Seattle")).await.unwrap_err();
        assert_eq!(err, FetchError::MalformedResponse);
    }

    #[tokio::test]
    async fn refused_connection_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{addr}"))
            .fetch_current(&city("Seattle"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::NetworkError(_)), "{err:?}");
        assert!(!err.to_string().contains("KEY"));
    }

    #[derive(Debug)]
    struct Delayed {
        delay: Duration,
    }

    #[async_trait]
    impl WeatherSource for Delayed {
        async fn fetch_current(&self, _query: &CityQuery) -> Result<RawWeather, FetchError> {
            tokio::time::sleep(self.delay).await;
            RawWeather::from_value(json!({ "name": "Seattle", "main": { "temp": 10 }, "sys": {} }))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_times_out() {
        let source = Delayed { delay: Duration::from_secs(30) };
        let res = fetch_weather(&source, &city("Seattle"), DEFAULT_TIMEOUT, &CancellationToken::new()).await;
        assert_eq!(res, Err(FetchError::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn fast_source_beats_timer() {
        let source = Delayed { delay: Duration::from_secs(2) };
        let res = fetch_weather(&source, &city("Seattle"), DEFAULT_TIMEOUT, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(res.temperature_f, Some(50));
    }

    #[test]
    fn request_url_on_host_root() {
        let c = WeatherClient::new("K".into(), Url::parse("http://127.0.0.1:8080").unwrap());
        assert_eq!(
            c.request_url(&city("New York")).as_str(),
            "http://127.0.0.1:8080/weather?q=New+York&appid=K&units=metric"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_during_flight_aborts_as_timeout() {
        let source = Delayed { delay: Duration::from_secs(5) };
        let token = CancellationToken::new();

        let canceller = {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                token.cancel();
            })
        };

        let started = tokio::time::Instant::now();
        let res = fetch_weather(&source, &city("Seattle"), DEFAULT_TIMEOUT, &token).await;
        assert_eq!(res, Err(FetchError::Timeout));
        // Aborted by the token, well before the source or the timer finish.
        assert!(started.elapsed() < Duration::from_secs(5));
        canceller.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_token_aborts_as_timeout() {
        let source = Delayed { delay: Duration::from_secs(2) };
        let token = CancellationToken::new();
        token.cancel();

        let res = fetch_weather(&source, &city("Seattle"), DEFAULT_TIMEOUT, &token).await;
        assert_eq!(res, Err(FetchError::Timeout));
    }
}
