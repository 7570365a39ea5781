use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A bookable appointment start time. The occupied interval is
/// `[start, start + duration)` for the service duration the slot was
/// computed with; `label` is the zero-padded 24-hour `HH:MM` start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub label: String,
    pub start: NaiveDateTime,
}

/// One already-booked interval for the professional and date under
/// consideration. The list handed to the availability engine must already
/// be scoped to a single professional and day by the query layer; the
/// shape deliberately carries no professional id, so the engine cannot
/// (and does not) re-filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookedInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}
