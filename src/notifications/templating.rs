//! Digest rendering with minijinja
//!
//! The template is registered once under a `.html` name so minijinja's
//! auto-escaping applies to everything the remote endpoint sent us.

use minijinja::{Environment, context};
use serde::Serialize;

use crate::errors::NotifyResult;
use crate::models::{SeatClass, Ticket};

const DIGEST_TEMPLATE_NAME: &str = "digest.html";

const DIGEST_TEMPLATE: &str = r#"<html>
<body>
<h2>Tickets for {{ date }}</h2>
<table border="1" cellpadding="4" cellspacing="0">
  <tr>
    <th>Train</th><th>From</th><th>To</th><th>Departs</th><th>Arrives</th>
    {%- for label in seat_labels %}<th>{{ label }}</th>{% endfor %}
  </tr>
  {%- for ticket in tickets %}
  <tr>
    <td>{{ ticket.trip }}</td><td>{{ ticket.start_code }}</td><td>{{ ticket.end_code }}</td>
    <td>{{ ticket.departure_time }}</td><td>{{ ticket.arrival_time }}</td>
    {%- for seat in ticket.seats %}
    <td>{% if seat.available %}<b>{{ seat.raw }}</b>{% else %}{{ seat.raw or "-" }}{% endif %}</td>
    {%- endfor %}
  </tr>
  {%- endfor %}
</table>
</body>
</html>
"#;

/// A rendered digest, ready for a [`super::Notifier`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub html: String,
}

#[derive(Serialize)]
struct SeatCell<'a> {
    raw: &'a str,
    available: bool,
}

#[derive(Serialize)]
struct TicketRow<'a> {
    trip: &'a str,
    start_code: &'a str,
    end_code: &'a str,
    departure_time: &'a str,
    arrival_time: &'a str,
    seats: Vec<SeatCell<'a>>,
}

impl<'a> From<&'a Ticket> for TicketRow<'a> {
    fn from(ticket: &'a Ticket) -> Self {
        Self {
            trip: &ticket.trip,
            start_code: &ticket.start_code,
            end_code: &ticket.end_code,
            departure_time: &ticket.departure_time,
            arrival_time: &ticket.arrival_time,
            seats: SeatClass::ALL
                .iter()
                .map(|class| SeatCell {
                    raw: ticket.raw_seat(*class),
                    available: ticket.has_seat(*class),
                })
                .collect(),
        }
    }
}

pub struct DigestRenderer {
    env: Environment<'static>,
}

impl DigestRenderer {
    pub fn new() -> NotifyResult<Self> {
        let mut env = Environment::new();
        env.add_template(DIGEST_TEMPLATE_NAME, DIGEST_TEMPLATE)?;
        Ok(Self { env })
    }

    pub fn subject(date: &str) -> String {
        format!("{date}-tickets")
    }

    pub fn render(&self, date: &str, tickets: &[Ticket]) -> NotifyResult<Digest> {
        let rows: Vec<TicketRow<'_>> = tickets.iter().map(TicketRow::from).collect();
        let labels: Vec<&str> = SeatClass::ALL.iter().map(SeatClass::label).collect();

        let html = self.env.get_template(DIGEST_TEMPLATE_NAME)?.render(context! {
            date => date,
            tickets => rows,
            seat_labels => labels,
        })?;

        Ok(Digest {
            subject: Self::subject(date),
            html,
        })
    }
}
