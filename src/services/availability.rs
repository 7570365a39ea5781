use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::{BookedInterval, Slot, WorkSchedule};

/// Inputs for one availability computation.
///
/// `now` is always injected by the caller: handlers pass the real clock
/// exactly once at the boundary, tests pass fixed values. The engine never
/// reads the wall clock itself.
pub struct SlotQuery<'a> {
    pub date: NaiveDate,
    pub schedule: Option<&'a WorkSchedule>,
    pub duration_minutes: i64,
    pub now: NaiveDateTime,
}

/// Generates the ungapped candidate start times for a day: from
/// `work_start`, stepping by the service duration, keeping a candidate iff
/// its occupied interval ends at or before `work_end`. No business hours
/// configured means no bookable time.
pub fn candidate_slots(
    date: NaiveDate,
    schedule: &WorkSchedule,
    duration_minutes: i64,
) -> Vec<Slot> {
    let (Some(work_start), Some(work_end)) = (schedule.work_start, schedule.work_end) else {
        return vec![];
    };
    if duration_minutes <= 0 {
        return vec![];
    }

    let duration = Duration::minutes(duration_minutes);
    let closing = date.and_time(work_end);

    let mut slots = vec![];
    let mut start = date.and_time(work_start);
    // Ending exactly at closing time is bookable.
    while start + duration <= closing {
        slots.push(Slot {
            label: start.format("%H:%M").to_string(),
            start,
        });
        start += duration;
    }
    slots
}

/// Computes the bookable slots for one professional and date.
///
/// `booked` must already be scoped to that professional and date by the
/// query layer; the intervals carry no professional id and are not
/// re-filtered here. Every input maps to a (possibly empty) slot list,
/// never an error, and the generator's chronological order is preserved.
pub fn available_slots(query: &SlotQuery, booked: &[BookedInterval]) -> Vec<Slot> {
    let Some(schedule) = query.schedule else {
        return vec![];
    };
    let duration = Duration::minutes(query.duration_minutes);

    candidate_slots(query.date, schedule, query.duration_minutes)
        .into_iter()
        .filter(|s| !starts_in_past(s, query.now))
        .filter(|s| !overlaps_lunch(s, duration, query.date, schedule))
        .filter(|s| !ends_after_close(s, duration, query.date, schedule))
        .filter(|s| !conflicts_with_booking(s, duration, booked))
        .collect()
}

/// Starting exactly at `now` is still bookable.
fn starts_in_past(slot: &Slot, now: NaiveDateTime) -> bool {
    slot.start < now
}

/// Half-open overlap against `[lunch_start, lunch_end)`: a slot ending
/// exactly at lunch start, or starting exactly at lunch end, does not
/// conflict. No lunch bounds means no lunch break.
fn overlaps_lunch(
    slot: &Slot,
    duration: Duration,
    date: NaiveDate,
    schedule: &WorkSchedule,
) -> bool {
    let (Some(lunch_start), Some(lunch_end)) = (schedule.lunch_start, schedule.lunch_end) else {
        return false;
    };
    let lunch_start = date.and_time(lunch_start);
    let lunch_end = date.and_time(lunch_end);
    slot.start < lunch_end && slot.start + duration > lunch_start
}

/// Held as an explicit invariant even though the generator already
/// guarantees it for its own candidates.
fn ends_after_close(
    slot: &Slot,
    duration: Duration,
    date: NaiveDate,
    schedule: &WorkSchedule,
) -> bool {
    match schedule.work_end {
        Some(work_end) => slot.start + duration > date.and_time(work_end),
        None => false,
    }
}

/// Same half-open rule as the lunch filter; back-to-back appointments are
/// allowed.
fn conflicts_with_booking(slot: &Slot, duration: Duration, booked: &[BookedInterval]) -> bool {
    let end = slot.start + duration;
    booked.iter().any(|b| slot.start < b.end && end > b.start)
}
