use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::domain::PlaceResult;

pub const FOURSQUARE_URL: &str = "https://api.foursquare.com/v3/places/search";
const UNREADABLE_BODY: &str = "<unreadable body>";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("places request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("places API returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("failed to parse places response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("places response has no \"results\" array")]
    MissingResults,
}

/// A result item that does not match the expected shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("result {index}: missing or invalid field \"{field}\"")]
pub struct ItemError {
    pub index: usize,
    pub field: &'static str,
}

/// Parameters of one places-search call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub category_id: String,
    /// Search radius in meters
    pub radius: u32,
    pub fields: Vec<String>,
}

impl SearchQuery {
    /// Query string parameters, nearest results first
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("ll", format!("{},{}", self.latitude, self.longitude)),
            ("categories", self.category_id.clone()),
            ("radius", self.radius.to_string()),
            ("sort", "DISTANCE".to_string()),
        ];
        if !self.fields.is_empty() {
            params.push(("fields", self.fields.join(",")));
        }
        params
    }
}

/// A places-search backend.
pub trait PlaceSearch {
    /// Issue one search and return the decoded body verbatim
    fn search(&self, query: &SearchQuery) -> Result<Value, SearchError>;
}

/// Foursquare Places API client
pub struct FoursquareClient {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl FoursquareClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SearchError::Client)?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

impl PlaceSearch for FoursquareClient {
    fn search(&self, query: &SearchQuery) -> Result<Value, SearchError> {
        tracing::debug!(
            ll = %format!("{},{}", query.latitude, query.longitude),
            category = %query.category_id,
            radius = query.radius,
            "searching places"
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&query.to_params())
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .send()
            .map_err(SearchError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_else(|e| {
                tracing::debug!(%status, error = %e, "failed to read error response body");
                UNREADABLE_BODY.to_string()
            });
            return Err(SearchError::Status { status, body });
        }

        response.json().map_err(SearchError::Decode)
    }
}

/// Validate a search response body.
///
/// The outer error means the body as a whole is unusable. Each item is
/// validated on its own so one malformed entry does not hide the others.
pub fn parse_results(body: &Value) -> Result<Vec<Result<PlaceResult, ItemError>>, SearchError> {
    let items = body
        .get("results")
        .and_then(Value::as_array)
        .ok_or(SearchError::MissingResults)?;

    Ok(items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_item(index, item))
        .collect())
}

fn parse_item(index: usize, item: &Value) -> Result<PlaceResult, ItemError> {
    let missing = |field| ItemError { index, field };

    let name = item
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| missing("name"))?;
    let distance = match item.get("distance") {
        Some(Value::Number(n)) => n.clone(),
        _ => return Err(missing("distance")),
    };
    let formatted_address = item
        .get("location")
        .and_then(|l| l.get("formatted_address"))
        .and_then(Value::as_str)
        .ok_or_else(|| missing("location.formatted_address"))?;

    Ok(PlaceResult {
        name: name.to_string(),
        distance,
        formatted_address: formatted_address.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn query() -> SearchQuery {
        SearchQuery {
            latitude: 10.0,
            longitude: 20.5,
            category_id: "13065".to_string(),
            radius: 500,
            fields: vec!["name".to_string(), "distance".to_string(), "location".to_string()],
        }
    }

    #[test]
    fn test_query_params() {
        let params = query().to_params();
        assert_eq!(
            params,
            vec![
                ("ll", "10,20.5".to_string()),
                ("categories", "13065".to_string()),
                ("radius", "500".to_string()),
                ("sort", "DISTANCE".to_string()),
                ("fields", "name,distance,location".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_params_without_fields() {
        let mut q = query();
        q.fields.clear();
        assert!(q.to_params().iter().all(|(k, _)| *k != "fields"));
    }

    #[test]
    fn test_search_sends_request() {
        let server = MockServer::start();
        let body = json!({"results": [
            {"name": "Casa Lucio", "distance": 120, "location": {"formatted_address": "Calle Cava Baja 35"}}
        ]});
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/places/search")
                .query_param("ll", "10,20.5")
                .query_param("categories", "13065")
                .query_param("radius", "500")
                .query_param("sort", "DISTANCE")
                .query_param("fields", "name,distance,location")
                .header("authorization", "secret-key")
                .header("accept", "application/json");
            then.status(200).json_body(body.clone());
        });

        let client =
            FoursquareClient::new(&server.url("/places/search"), "secret-key", Duration::from_secs(5))
                .unwrap();
        let value = client.search(&query()).unwrap();

        mock.assert();
        assert_eq!(value, body);
    }

    #[test]
    fn test_search_error_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/places/search");
            then.status(401).body("invalid key");
        });

        let client =
            FoursquareClient::new(&server.url("/places/search"), "bad", Duration::from_secs(5))
                .unwrap();
        match client.search(&query()) {
            Err(SearchError::Status { status, body }) => {
                assert_eq!(status.as_u16(), 401);
                assert_eq!(body, "invalid key");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_search_non_json_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/places/search");
            then.status(200)
                .header("Content-Type", "text/html")
                .body("<html>oops</html>");
        });

        let client =
            FoursquareClient::new(&server.url("/places/search"), "key", Duration::from_secs(5))
                .unwrap();
        assert!(matches!(client.search(&query()), Err(SearchError::Decode(_))));
    }

    #[test]
    fn test_search_unreachable_host() {
        let client =
            FoursquareClient::new("http://127.0.0.1:9/places/search", "key", Duration::from_secs(5))
                .unwrap();
        assert!(matches!(client.search(&query()), Err(SearchError::Request(_))));
    }

    #[test]
    fn test_search_error_status_with_truncated_body() {
        use std::io::{Read, Write};
        use std::net::TcpListener;

        // Announces more body than it sends, so reading the body fails
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            stream
                .write_all(b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 100\r\n\r\npartial")
                .unwrap();
        });

        let client = FoursquareClient::new(
            &format!("http://{}/places/search", addr),
            "key",
            Duration::from_secs(5),
        )
        .unwrap();
        let result = client.search(&query());
        server.join().unwrap();

        match result {
            Err(SearchError::Status { status, body }) => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, UNREADABLE_BODY);
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_results() {
        let body = json!({"results": [
            {"name": "Café X", "distance": 50, "location": {"formatted_address": "1 Main St"}},
            {"name": "No Address", "distance": 70, "location": {}},
            {"distance": 80, "location": {"formatted_address": "2 Main St"}}
        ]});

        let items = parse_results(&body).unwrap();
        assert_eq!(items.len(), 3);

        let first = items[0].as_ref().unwrap();
        assert_eq!(first.name, "Café X");
        assert_eq!(first.distance, serde_json::Number::from(50));
        assert_eq!(first.formatted_address, "1 Main St");

        assert_eq!(
            items[1],
            Err(ItemError {
                index: 1,
                field: "location.formatted_address"
            })
        );
        assert_eq!(items[2], Err(ItemError { index: 2, field: "name" }));
    }

    #[test]
    fn test_parse_results_missing_key() {
        let body = json!({"message": "Quota exceeded"});
        assert!(matches!(
            parse_results(&body),
            Err(SearchError::MissingResults)
        ));
    }

    #[test]
    fn test_parse_results_empty() {
        let items = parse_results(&json!({"results": []})).unwrap();
        assert!(items.is_empty());
    }
}
