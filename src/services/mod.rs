pub mod availability;
pub mod scheduling;
pub mod slot_feed;
