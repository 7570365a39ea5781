use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professional {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub work_start_time: Option<NaiveTime>,
    pub work_end_time: Option<NaiveTime>,
    pub lunch_start_time: Option<NaiveTime>,
    pub lunch_end_time: Option<NaiveTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Business-hours and lunch-break bounds for one professional. Each bound
/// is independently optional; a missing bound means "no constraint".
#[derive(Debug, Clone, Default)]
pub struct WorkSchedule {
    pub work_start: Option<NaiveTime>,
    pub work_end: Option<NaiveTime>,
    pub lunch_start: Option<NaiveTime>,
    pub lunch_end: Option<NaiveTime>,
}

impl Professional {
    pub fn schedule(&self) -> WorkSchedule {
        WorkSchedule {
            work_start: self.work_start_time,
            work_end: self.work_end_time,
            lunch_start: self.lunch_start_time,
            lunch_end: self.lunch_end_time,
        }
    }
}

pub fn parse_hhmm(s: &str) -> anyhow::Result<NaiveTime> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("invalid time format: {s}"));
    }
    let hour: u32 = parts[0]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = parts[1]
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| anyhow::anyhow!("time out of range: {s}"))
}

pub fn format_hhmm(t: &NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_time() {
        let t = parse_hhmm("09:30").unwrap();
        assert_eq!(format_hhmm(&t), "09:30");
    }

    #[test]
    fn test_parse_midnight_and_late() {
        assert!(parse_hhmm("00:00").is_ok());
        assert!(parse_hhmm("23:59").is_ok());
    }

    #[test]
    fn test_parse_out_of_range() {
        assert!(parse_hhmm("24:00").is_err());
        assert!(parse_hhmm("09:60").is_err());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_hhmm("0900").is_err());
        assert!(parse_hhmm("9:0:0").is_err());
        assert!(parse_hhmm("nine").is_err());
    }
}
