use chrono::{Duration, NaiveDateTime};

use crate::models::{BookedInterval, WorkSchedule};

#[derive(Debug, PartialEq)]
pub enum SchedulingError {
    OutsideBusinessHours,
    DuringLunchBreak,
    Conflict,
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingError::OutsideBusinessHours => {
                write!(f, "that time is outside the professional's business hours")
            }
            SchedulingError::DuringLunchBreak => {
                write!(f, "that time falls within the professional's lunch break")
            }
            SchedulingError::Conflict => {
                write!(f, "that time slot is already booked")
            }
        }
    }
}

/// Validates a proposed appointment against the professional's schedule and
/// their existing appointments for the day. `booked` must already be scoped
/// to the professional and date, same contract as the availability engine.
/// Interval conventions are half-open throughout, so back-to-back
/// appointments are accepted.
pub fn validate_appointment_time(
    schedule: &WorkSchedule,
    start: NaiveDateTime,
    duration_minutes: i64,
    booked: &[BookedInterval],
) -> Result<(), SchedulingError> {
    let end = start + Duration::minutes(duration_minutes);
    let date = start.date();

    if let (Some(work_start), Some(work_end)) = (schedule.work_start, schedule.work_end) {
        if start < date.and_time(work_start) || end > date.and_time(work_end) {
            return Err(SchedulingError::OutsideBusinessHours);
        }
    }

    if let (Some(lunch_start), Some(lunch_end)) = (schedule.lunch_start, schedule.lunch_end) {
        if start < date.and_time(lunch_end) && end > date.and_time(lunch_start) {
            return Err(SchedulingError::DuringLunchBreak);
        }
    }

    for b in booked {
        if start < b.end && end > b.start {
            return Err(SchedulingError::Conflict);
        }
    }

    Ok(())
}
