pub mod appointment;
pub mod client;
pub mod financial_entry;
pub mod product;
pub mod professional;
pub mod service_item;
pub mod slot;
pub mod tenant;

pub use appointment::{Appointment, AppointmentStatus};
pub use client::Client;
pub use financial_entry::{EntryType, FinancialEntry};
pub use product::Product;
pub use professional::{Professional, WorkSchedule};
pub use service_item::ServiceItem;
pub use slot::{BookedInterval, Slot};
pub use tenant::Tenant;
