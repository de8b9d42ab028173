//! Client for the 12306 `leftTicket` endpoint
//!
//! The endpoint periodically moves its query route. A request against the
//! default route answers with a JSON body carrying the current route in
//! `c_url`, so every query is two GETs:
//!
//! 1. baseline URL built on the configured default route, to discover `c_url`
//! 2. the corrected URL, whose `data.result` holds pipe-delimited train records
//!
//! A missing or unparsable `c_url` just means the baseline URL is used.

use async_trait::async_trait;
use reqwest::{Client, redirect};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::traits::AvailabilityQueryClient;
use crate::config::QueryConfig;
use crate::errors::{QueryError, QueryResult};
use crate::models::{SeatFields, Ticket};

/// Records shorter than this cannot carry every positional field we read
const MIN_RECORD_FIELDS: usize = 14;

#[derive(Debug, Clone)]
pub struct LeftTicketClient {
    client: Client,
    base_url: String,
    default_route: String,
}

impl LeftTicketClient {
    pub fn new(config: &QueryConfig) -> Result<Self, reqwest::Error> {
        if config.accept_invalid_certs {
            warn!(
                "TLS certificate verification is disabled for {}",
                config.base_url
            );
        }

        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self::with_client(
            client,
            &config.base_url,
            &config.default_route,
        ))
    }

    pub fn with_client(client: Client, base_url: &str, default_route: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_route: default_route.trim_matches('/').to_string(),
        }
    }

    pub fn query_url(
        &self,
        route: &str,
        date: &str,
        start_code: &str,
        end_code: &str,
    ) -> QueryResult<Url> {
        let url = format!(
            "{}/{}?leftTicketDTO.train_date={}&leftTicketDTO.from_station={}&leftTicketDTO.to_station={}&purpose_codes=ADULT",
            self.base_url,
            route.trim_matches('/'),
            date,
            start_code,
            end_code
        );
        Ok(Url::parse(&url)?)
    }

    /// Step one: ask the default route where queries should go today
    pub async fn resolve_query_url(
        &self,
        date: &str,
        start_code: &str,
        end_code: &str,
    ) -> QueryResult<Url> {
        let baseline = self.query_url(&self.default_route, date, start_code, end_code)?;
        let body = self.get_json(&baseline).await?;

        match body
            .as_ref()
            .and_then(|v| v.get("c_url"))
            .and_then(Value::as_str)
        {
            Some(route) if !route.trim().is_empty() => {
                debug!("Endpoint redirected query route to '{}'", route);
                self.query_url(route, date, start_code, end_code)
            }
            _ => {
                debug!("No route token in response, using baseline URL");
                Ok(baseline)
            }
        }
    }

    /// GET `url` and try to read the body as JSON. `Ok(None)` when the body is
    /// not JSON; transport failures are errors.
    async fn get_json(&self, url: &Url) -> QueryResult<Option<Value>> {
        let transport = |source: reqwest::Error| {
            if source.is_timeout() {
                QueryError::Timeout {
                    url: url.to_string(),
                }
            } else {
                QueryError::Transport {
                    url: url.to_string(),
                    source,
                }
            }
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport)?;

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                debug!("Non-JSON response ({}) from {}: {}", status, url, e);
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl AvailabilityQueryClient for LeftTicketClient {
    async fn query(
        &self,
        date: &str,
        start_code: &str,
        end_code: &str,
    ) -> QueryResult<Vec<Ticket>> {
        let url = self.resolve_query_url(date, start_code, end_code).await?;
        let body = self.get_json(&url).await?;

        let tickets = body
            .as_ref()
            .map(|v| parse_tickets(v, date))
            .unwrap_or_default();
        debug!(
            "Query {} {}->{} returned {} trains",
            date,
            start_code,
            end_code,
            tickets.len()
        );
        Ok(tickets)
    }
}

/// Extract every parsable record under `data.result`. Any other shape is empty.
pub fn parse_tickets(body: &Value, date: &str) -> Vec<Ticket> {
    let Some(records) = body
        .get("data")
        .and_then(|d| d.get("result"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    records
        .iter()
        .filter_map(Value::as_str)
        .filter_map(|record| parse_record(record, date))
        .collect()
}

/// Map one pipe-delimited record onto a [`Ticket`] by position
pub fn parse_record(record: &str, date: &str) -> Option<Ticket> {
    let fields: Vec<&str> = record.split('|').collect();
    let len = fields.len();
    if len < MIN_RECORD_FIELDS {
        debug!("Dropping short record with {} fields", len);
        return None;
    }
    let back = |offset: usize| fields[len - offset].to_string();

    let seats = SeatFields {
        business: back(5),
        first: back(6),
        second: back(7),
        soft_sleeper: back(14),
        hard_sleeper: back(9),
        hard_seat: back(8),
        no_seat: back(11),
    };

    Some(Ticket::new(
        fields[3], date, fields[6], fields[7], fields[8], fields[9], seats,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeatClass;
    use serde_json::json;

    /// Builds a record the way the endpoint lays it out: fixed head, then a
    /// tail whose offsets from the end carry the seat counts.
    fn record(trip: &str, second: &str, hard_sleeper: &str, hard_seat: &str) -> String {
        let mut fields: Vec<String> = vec![
            "secret".into(),
            "预订".into(),
            "240000G1010A".into(),
            trip.into(),
            "VNP".into(),
            "AOH".into(),
            "BJP".into(),
            "SHH".into(),
            "06:36".into(),
            "12:40".into(),
        ];
        let mut tail = vec![String::new(); 14];
        tail[14 - 11] = "无".into(); // no seat
        tail[14 - 9] = hard_sleeper.into();
        tail[14 - 8] = hard_seat.into();
        tail[14 - 7] = second.into();
        tail[14 - 6] = "无".into(); // first
        fields.extend(tail);
        fields.join("|")
    }

    #[test]
    fn test_parse_record_positions() {
        let ticket = parse_record(&record("G101", "5", "2", "有"), "2024-05-01").unwrap();
        assert_eq!(ticket.trip, "G101");
        assert_eq!(ticket.start_code, "BJP");
        assert_eq!(ticket.end_code, "SHH");
        assert_eq!(ticket.departure_time, "06:36");
        assert_eq!(ticket.arrival_time, "12:40");
        assert_eq!(ticket.raw_seat(SeatClass::Second), "5");
        assert_eq!(ticket.raw_seat(SeatClass::HardSleeper), "2");
        assert_eq!(ticket.raw_seat(SeatClass::HardSeat), "有");
        assert_eq!(ticket.raw_seat(SeatClass::NoSeat), "无");
    }

    #[test]
    fn test_short_records_are_dropped() {
        assert!(parse_record("a|b|c|G1", "2024-05-01").is_none());
    }

    #[test]
    fn test_parse_tickets_tolerates_bad_shapes() {
        assert!(parse_tickets(&json!({"status": false}), "2024-05-01").is_empty());
        assert!(parse_tickets(&json!({"data": {"result": "nope"}}), "2024-05-01").is_empty());

        let body = json!({"data": {"result": [record("G1", "1", "", ""), 42, "x|y"]}});
        let tickets = parse_tickets(&body, "2024-05-01");
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].trip, "G1");
    }

    #[test]
    fn test_query_url_layout() {
        let client = LeftTicketClient::with_client(
            Client::new(),
            "https://kyfw.12306.cn/otn/",
            "leftTicket/query",
        );
        let url = client
            .query_url("leftTicket/queryZ", "2024-05-01", "BJP", "SHH")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://kyfw.12306.cn/otn/leftTicket/queryZ?leftTicketDTO.train_date=2024-05-01&leftTicketDTO.from_station=BJP&leftTicketDTO.to_station=SHH&purpose_codes=ADULT"
        );
    }
}
