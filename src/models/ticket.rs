//! Availability snapshot for one train on one travel date.
//!
//! A [`Ticket`] keeps the raw seat strings exactly as the remote endpoint
//! returned them. Whether a class has seats is derived on demand through
//! [`SeatAvailability::normalize`], so the raw field and the derived flag can
//! never disagree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Seat classes reported by the left-ticket endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatClass {
    Business,
    First,
    Second,
    SoftSleeper,
    HardSleeper,
    HardSeat,
    NoSeat,
}

impl SeatClass {
    pub const ALL: [SeatClass; 7] = [
        SeatClass::Business,
        SeatClass::First,
        SeatClass::Second,
        SeatClass::SoftSleeper,
        SeatClass::HardSleeper,
        SeatClass::HardSeat,
        SeatClass::NoSeat,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SeatClass::Business => "Business",
            SeatClass::First => "First class",
            SeatClass::Second => "Second class",
            SeatClass::SoftSleeper => "Soft sleeper",
            SeatClass::HardSleeper => "Hard sleeper",
            SeatClass::HardSeat => "Hard seat",
            SeatClass::NoSeat => "Standing",
        }
    }
}

impl fmt::Display for SeatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Normalized reading of a raw seat field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum SeatAvailability {
    /// A numeric remaining-seat count
    Count(u32),
    /// `有`: seats available, count not disclosed
    Plenty,
    /// `无`, `--`, `*` or anything else the endpoint uses to mean "not on sale"
    Unavailable,
    /// Empty field: the train does not carry this class
    Empty,
}

impl SeatAvailability {
    pub fn normalize(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return SeatAvailability::Empty;
        }
        if let Ok(count) = raw.parse::<u32>() {
            return SeatAvailability::Count(count);
        }
        match raw {
            "有" => SeatAvailability::Plenty,
            _ => SeatAvailability::Unavailable,
        }
    }

    pub fn has_seats(&self) -> bool {
        match self {
            SeatAvailability::Count(n) => *n > 0,
            SeatAvailability::Plenty => true,
            SeatAvailability::Unavailable | SeatAvailability::Empty => false,
        }
    }
}

/// Raw seat fields in the order the endpoint's pipe-delimited record exposes them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatFields {
    pub business: String,
    pub first: String,
    pub second: String,
    pub soft_sleeper: String,
    pub hard_sleeper: String,
    pub hard_seat: String,
    pub no_seat: String,
}

/// One trip's availability snapshot. Produced fresh on every successful
/// query and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub trip: String,
    pub date: String,
    pub start_code: String,
    pub end_code: String,
    pub departure_time: String,
    pub arrival_time: String,
    seats: SeatFields,
}

impl Ticket {
    pub fn new(
        trip: impl Into<String>,
        date: impl Into<String>,
        start_code: impl Into<String>,
        end_code: impl Into<String>,
        departure_time: impl Into<String>,
        arrival_time: impl Into<String>,
        seats: SeatFields,
    ) -> Self {
        Self {
            trip: trip.into(),
            date: date.into(),
            start_code: start_code.into(),
            end_code: end_code.into(),
            departure_time: departure_time.into(),
            arrival_time: arrival_time.into(),
            seats,
        }
    }

    /// Raw field for `class`, untouched
    pub fn raw_seat(&self, class: SeatClass) -> &str {
        match class {
            SeatClass::Business => &self.seats.business,
            SeatClass::First => &self.seats.first,
            SeatClass::Second => &self.seats.second,
            SeatClass::SoftSleeper => &self.seats.soft_sleeper,
            SeatClass::HardSleeper => &self.seats.hard_sleeper,
            SeatClass::HardSeat => &self.seats.hard_seat,
            SeatClass::NoSeat => &self.seats.no_seat,
        }
    }

    pub fn seat(&self, class: SeatClass) -> SeatAvailability {
        SeatAvailability::normalize(self.raw_seat(class))
    }

    pub fn has_seat(&self, class: SeatClass) -> bool {
        self.seat(class).has_seats()
    }

    pub fn has_any_seat(&self) -> bool {
        SeatClass::ALL.iter().any(|class| self.has_seat(*class))
    }

    pub fn seats(&self) -> &SeatFields {
        &self.seats
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Train Trip {{{}}} Date:{{{}}}>", self.trip, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ticket_with(seats: SeatFields) -> Ticket {
        Ticket::new("G101", "2024-05-01", "BJP", "SHH", "06:36", "12:40", seats)
    }

    #[rstest]
    #[case("5", SeatAvailability::Count(5), true)]
    #[case("0", SeatAvailability::Count(0), false)]
    #[case("有", SeatAvailability::Plenty, true)]
    #[case("无", SeatAvailability::Unavailable, false)]
    #[case("--", SeatAvailability::Unavailable, false)]
    #[case("*", SeatAvailability::Unavailable, false)]
    #[case("", SeatAvailability::Empty, false)]
    #[case("  12 ", SeatAvailability::Count(12), true)]
    fn test_normalize(
        #[case] raw: &str,
        #[case] expected: SeatAvailability,
        #[case] has_seats: bool,
    ) {
        let normalized = SeatAvailability::normalize(raw);
        assert_eq!(normalized, expected);
        assert_eq!(normalized.has_seats(), has_seats);
    }

    #[test]
    fn test_has_seat_is_derived_from_raw_field_for_every_class() {
        let seats = SeatFields {
            business: "有".into(),
            first: "无".into(),
            second: "5".into(),
            soft_sleeper: "--".into(),
            hard_sleeper: "".into(),
            hard_seat: "0".into(),
            no_seat: "*".into(),
        };
        let ticket = ticket_with(seats);

        for class in SeatClass::ALL {
            assert_eq!(
                ticket.has_seat(class),
                SeatAvailability::normalize(ticket.raw_seat(class)).has_seats(),
                "mismatch for {class}"
            );
        }
        assert!(ticket.has_seat(SeatClass::Business));
        assert!(ticket.has_seat(SeatClass::Second));
        assert!(!ticket.has_seat(SeatClass::HardSeat));
    }

    #[test]
    fn test_hard_sleeper_and_hard_seat_are_independent() {
        let ticket = ticket_with(SeatFields {
            hard_sleeper: "3".into(),
            hard_seat: "无".into(),
            ..Default::default()
        });
        assert!(ticket.has_seat(SeatClass::HardSleeper));
        assert!(!ticket.has_seat(SeatClass::HardSeat));
    }

    #[test]
    fn test_display() {
        let ticket = ticket_with(SeatFields::default());
        assert_eq!(ticket.to_string(), "<Train Trip {G101} Date:{2024-05-01}>");
        assert!(!ticket.has_any_seat());
    }
}
