//! Fakes and builders shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use ticket_watch::config::Config;
use ticket_watch::context::{AppContext, AppParts};
use ticket_watch::errors::{NotifyError, NotifyResult, QueryError, QueryResult};
use ticket_watch::job_scheduling::{InMemoryJobStore, JobStore};
use ticket_watch::models::{SeatFields, Station, Ticket, WatchJob, WatchRequest};
use ticket_watch::notifications::Notifier;
use ticket_watch::sources::AvailabilityQueryClient;
use ticket_watch::stations::InMemoryStationDirectory;

#[derive(Debug, Clone)]
pub enum Behavior {
    Tickets(Vec<Ticket>),
    Timeout,
}

/// Query client answering every call the same way, optionally after a delay
#[derive(Clone)]
pub struct FakeQueryClient {
    behavior: Arc<Mutex<Behavior>>,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl FakeQueryClient {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            delay: Duration::ZERO,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AvailabilityQueryClient for FakeQueryClient {
    async fn query(
        &self,
        date: &str,
        start_code: &str,
        end_code: &str,
    ) -> QueryResult<Vec<Ticket>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            Behavior::Tickets(tickets) => Ok(tickets),
            Behavior::Timeout => Err(QueryError::Timeout {
                url: format!("fake://{date}/{start_code}/{end_code}"),
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SentDigest {
    pub subject: String,
    pub html: String,
    pub recipients: Vec<String>,
}

/// Notifier that records every digest instead of delivering it
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentDigest>>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<SentDigest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        subject: &str,
        html_body: &str,
        recipients: &[String],
    ) -> NotifyResult<()> {
        if self.fail {
            return Err(NotifyError::Smtp("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(SentDigest {
            subject: subject.to_string(),
            html: html_body.to_string(),
            recipients: recipients.to_vec(),
        });
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "recording"
    }
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 4, 1, 8, 0, 0).unwrap()
}

pub fn secs(n: i64) -> chrono::TimeDelta {
    chrono::TimeDelta::seconds(n)
}

pub fn stations() -> InMemoryStationDirectory {
    InMemoryStationDirectory::new([
        Station::new("北京", "BJP"),
        Station::new("上海", "SHH"),
        Station::new("广州", "GZQ"),
    ])
}

/// One BJP->SHH train on 2024-05-01 with only second class on sale
pub fn second_class_ticket() -> Ticket {
    Ticket::new(
        "G101",
        "2024-05-01",
        "BJP",
        "SHH",
        "06:36",
        "12:40",
        SeatFields {
            business: "".into(),
            first: "无".into(),
            second: "5".into(),
            soft_sleeper: "".into(),
            hard_sleeper: "无".into(),
            hard_seat: "".into(),
            no_seat: "无".into(),
        },
    )
}

pub fn sold_out_ticket() -> Ticket {
    Ticket::new(
        "G103",
        "2024-05-01",
        "BJP",
        "SHH",
        "07:00",
        "12:58",
        SeatFields {
            first: "无".into(),
            second: "无".into(),
            ..Default::default()
        },
    )
}

pub fn watch_request() -> WatchRequest {
    WatchRequest {
        date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        start_station: "北京".to_string(),
        end_station: "上海".to_string(),
        email: "rider@example.com".to_string(),
    }
}

pub struct Harness {
    pub context: AppContext,
    pub store: Arc<InMemoryJobStore>,
    pub client: FakeQueryClient,
    pub notifier: RecordingNotifier,
}

impl Harness {
    pub fn new(client: FakeQueryClient, notifier: RecordingNotifier) -> Self {
        Self::with_config(Config::default(), client, notifier)
    }

    pub fn with_config(config: Config, client: FakeQueryClient, notifier: RecordingNotifier) -> Self {
        let store = Arc::new(InMemoryJobStore::new());
        let parts = AppParts {
            store: store.clone(),
            stations: Arc::new(stations()),
            client: Arc::new(client.clone()),
            notifier: Arc::new(notifier.clone()),
        };
        let context = AppContext::from_parts(config, None, parts).unwrap();
        Self {
            context,
            store,
            client,
            notifier,
        }
    }

    /// Register the standard request at `t0()`; first firing is due at `t0() + 60s`
    pub async fn register(&self) -> WatchJob {
        self.context
            .jobs
            .register_with_id(Uuid::now_v7(), watch_request(), t0())
            .await
            .unwrap()
    }

    pub async fn job(&self, id: Uuid) -> Option<WatchJob> {
        self.store.get(id).await.unwrap()
    }
}
