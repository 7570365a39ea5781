use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::professional::{format_hhmm, parse_hhmm};
use crate::models::{
    Appointment, AppointmentStatus, BookedInterval, Client, EntryType, FinancialEntry, Product,
    Professional, ServiceItem, Tenant,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn fmt_dt(dt: &NaiveDateTime) -> String {
    dt.format(TS_FORMAT).to_string()
}

fn parse_dt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Tenants ──

pub fn create_tenant(conn: &Connection, tenant: &Tenant) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO tenants (id, name, api_token, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            tenant.id,
            tenant.name,
            tenant.api_token,
            fmt_dt(&tenant.created_at)
        ],
    )?;
    Ok(())
}

pub fn get_tenant_by_token(conn: &Connection, token: &str) -> anyhow::Result<Option<Tenant>> {
    let result = conn.query_row(
        "SELECT id, name, api_token, created_at FROM tenants WHERE api_token = ?1",
        params![token],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        },
    );

    match result {
        Ok((id, name, api_token, created_at)) => Ok(Some(Tenant {
            id,
            name,
            api_token,
            created_at: parse_dt(&created_at),
        })),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

// ── Clients ──

const CLIENT_COLUMNS: &str = "id, tenant_id, name, phone, email, notes, created_at, updated_at";

fn parse_client_row(row: &rusqlite::Row) -> rusqlite::Result<Client> {
    let created_at: String = row.get(6)?;
    let updated_at: String = row.get(7)?;
    Ok(Client {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        notes: row.get(5)?,
        created_at: parse_dt(&created_at),
        updated_at: parse_dt(&updated_at),
    })
}

pub fn create_client(conn: &Connection, client: &Client) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO clients (id, tenant_id, name, phone, email, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            client.id,
            client.tenant_id,
            client.name,
            client.phone,
            client.email,
            client.notes,
            fmt_dt(&client.created_at),
            fmt_dt(&client.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_clients(conn: &Connection, tenant_id: &str) -> anyhow::Result<Vec<Client>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CLIENT_COLUMNS} FROM clients WHERE tenant_id = ?1 ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map(params![tenant_id], parse_client_row)?;

    let mut clients = vec![];
    for row in rows {
        clients.push(row?);
    }
    Ok(clients)
}

pub fn update_client(conn: &Connection, client: &Client) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE clients SET name = ?1, phone = ?2, email = ?3, notes = ?4, updated_at = ?5
         WHERE id = ?6 AND tenant_id = ?7",
        params![
            client.name,
            client.phone,
            client.email,
            client.notes,
            fmt_dt(&Utc::now().naive_utc()),
            client.id,
            client.tenant_id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_client(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM clients WHERE id = ?1 AND tenant_id = ?2",
        params![id, tenant_id],
    )?;
    Ok(count > 0)
}

// ── Professionals ──

const PROFESSIONAL_COLUMNS: &str = "id, tenant_id, name, work_start_time, work_end_time, \
     lunch_start_time, lunch_end_time, created_at, updated_at";

fn parse_professional_row(row: &rusqlite::Row) -> rusqlite::Result<Professional> {
    let work_start: Option<String> = row.get(3)?;
    let work_end: Option<String> = row.get(4)?;
    let lunch_start: Option<String> = row.get(5)?;
    let lunch_end: Option<String> = row.get(6)?;
    let created_at: String = row.get(7)?;
    let updated_at: String = row.get(8)?;

    let time = |s: Option<String>| s.and_then(|v| parse_hhmm(&v).ok());

    Ok(Professional {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        work_start_time: time(work_start),
        work_end_time: time(work_end),
        lunch_start_time: time(lunch_start),
        lunch_end_time: time(lunch_end),
        created_at: parse_dt(&created_at),
        updated_at: parse_dt(&updated_at),
    })
}

pub fn create_professional(conn: &Connection, pro: &Professional) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO professionals (id, tenant_id, name, work_start_time, work_end_time,
             lunch_start_time, lunch_end_time, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            pro.id,
            pro.tenant_id,
            pro.name,
            pro.work_start_time.as_ref().map(format_hhmm),
            pro.work_end_time.as_ref().map(format_hhmm),
            pro.lunch_start_time.as_ref().map(format_hhmm),
            pro.lunch_end_time.as_ref().map(format_hhmm),
            fmt_dt(&pro.created_at),
            fmt_dt(&pro.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_professionals(conn: &Connection, tenant_id: &str) -> anyhow::Result<Vec<Professional>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROFESSIONAL_COLUMNS} FROM professionals WHERE tenant_id = ?1 ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map(params![tenant_id], parse_professional_row)?;

    let mut pros = vec![];
    for row in rows {
        pros.push(row?);
    }
    Ok(pros)
}

pub fn get_professional_by_id(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
) -> anyhow::Result<Option<Professional>> {
    let result = conn.query_row(
        &format!("SELECT {PROFESSIONAL_COLUMNS} FROM professionals WHERE id = ?1 AND tenant_id = ?2"),
        params![id, tenant_id],
        parse_professional_row,
    );

    match result {
        Ok(pro) => Ok(Some(pro)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_professional(conn: &Connection, pro: &Professional) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE professionals SET name = ?1, work_start_time = ?2, work_end_time = ?3,
             lunch_start_time = ?4, lunch_end_time = ?5, updated_at = ?6
         WHERE id = ?7 AND tenant_id = ?8",
        params![
            pro.name,
            pro.work_start_time.as_ref().map(format_hhmm),
            pro.work_end_time.as_ref().map(format_hhmm),
            pro.lunch_start_time.as_ref().map(format_hhmm),
            pro.lunch_end_time.as_ref().map(format_hhmm),
            fmt_dt(&Utc::now().naive_utc()),
            pro.id,
            pro.tenant_id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_professional(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM professionals WHERE id = ?1 AND tenant_id = ?2",
        params![id, tenant_id],
    )?;
    Ok(count > 0)
}

// ── Services ──

const SERVICE_COLUMNS: &str =
    "id, tenant_id, name, duration_minutes, price_cents, created_at, updated_at";

fn parse_service_row(row: &rusqlite::Row) -> rusqlite::Result<ServiceItem> {
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;
    Ok(ServiceItem {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        duration_minutes: row.get(3)?,
        price_cents: row.get(4)?,
        created_at: parse_dt(&created_at),
        updated_at: parse_dt(&updated_at),
    })
}

pub fn create_service(conn: &Connection, service: &ServiceItem) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO services (id, tenant_id, name, duration_minutes, price_cents, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            service.id,
            service.tenant_id,
            service.name,
            service.duration_minutes,
            service.price_cents,
            fmt_dt(&service.created_at),
            fmt_dt(&service.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_services(conn: &Connection, tenant_id: &str) -> anyhow::Result<Vec<ServiceItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE tenant_id = ?1 ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map(params![tenant_id], parse_service_row)?;

    let mut services = vec![];
    for row in rows {
        services.push(row?);
    }
    Ok(services)
}

pub fn get_service_by_id(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
) -> anyhow::Result<Option<ServiceItem>> {
    let result = conn.query_row(
        &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1 AND tenant_id = ?2"),
        params![id, tenant_id],
        parse_service_row,
    );

    match result {
        Ok(service) => Ok(Some(service)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_service(conn: &Connection, service: &ServiceItem) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, duration_minutes = ?2, price_cents = ?3, updated_at = ?4
         WHERE id = ?5 AND tenant_id = ?6",
        params![
            service.name,
            service.duration_minutes,
            service.price_cents,
            fmt_dt(&Utc::now().naive_utc()),
            service.id,
            service.tenant_id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_service(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM services WHERE id = ?1 AND tenant_id = ?2",
        params![id, tenant_id],
    )?;
    Ok(count > 0)
}

// ── Products ──

const PRODUCT_COLUMNS: &str =
    "id, tenant_id, name, price_cents, stock_quantity, created_at, updated_at";

fn parse_product_row(row: &rusqlite::Row) -> rusqlite::Result<Product> {
    let created_at: String = row.get(5)?;
    let updated_at: String = row.get(6)?;
    Ok(Product {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        price_cents: row.get(3)?,
        stock_quantity: row.get(4)?,
        created_at: parse_dt(&created_at),
        updated_at: parse_dt(&updated_at),
    })
}

pub fn create_product(conn: &Connection, product: &Product) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO products (id, tenant_id, name, price_cents, stock_quantity, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            product.id,
            product.tenant_id,
            product.name,
            product.price_cents,
            product.stock_quantity,
            fmt_dt(&product.created_at),
            fmt_dt(&product.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_products(conn: &Connection, tenant_id: &str) -> anyhow::Result<Vec<Product>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = ?1 ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map(params![tenant_id], parse_product_row)?;

    let mut products = vec![];
    for row in rows {
        products.push(row?);
    }
    Ok(products)
}

pub fn update_product(conn: &Connection, product: &Product) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE products SET name = ?1, price_cents = ?2, stock_quantity = ?3, updated_at = ?4
         WHERE id = ?5 AND tenant_id = ?6",
        params![
            product.name,
            product.price_cents,
            product.stock_quantity,
            fmt_dt(&Utc::now().naive_utc()),
            product.id,
            product.tenant_id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_product(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM products WHERE id = ?1 AND tenant_id = ?2",
        params![id, tenant_id],
    )?;
    Ok(count > 0)
}

// ── Appointments ──

const APPOINTMENT_COLUMNS: &str = "id, tenant_id, professional_id, client_id, service_id, \
     start_time, end_time, status, notes, created_at, updated_at";

fn parse_appointment_row(row: &rusqlite::Row) -> rusqlite::Result<Appointment> {
    let start_time: String = row.get(5)?;
    let end_time: String = row.get(6)?;
    let status: String = row.get(7)?;
    let created_at: String = row.get(9)?;
    let updated_at: String = row.get(10)?;

    Ok(Appointment {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        professional_id: row.get(2)?,
        client_id: row.get(3)?,
        service_id: row.get(4)?,
        start_time: parse_dt(&start_time),
        end_time: parse_dt(&end_time),
        status: AppointmentStatus::parse(&status),
        notes: row.get(8)?,
        created_at: parse_dt(&created_at),
        updated_at: parse_dt(&updated_at),
    })
}

pub fn create_appointment(conn: &Connection, appt: &Appointment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO appointments (id, tenant_id, professional_id, client_id, service_id,
             start_time, end_time, status, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            appt.id,
            appt.tenant_id,
            appt.professional_id,
            appt.client_id,
            appt.service_id,
            fmt_dt(&appt.start_time),
            fmt_dt(&appt.end_time),
            appt.status.as_str(),
            appt.notes,
            fmt_dt(&appt.created_at),
            fmt_dt(&appt.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_appointments_for_day(
    conn: &Connection,
    tenant_id: &str,
    professional_id: Option<&str>,
    date: NaiveDate,
) -> anyhow::Result<Vec<Appointment>> {
    let day_start = format!("{} 00:00:00", date.format("%Y-%m-%d"));
    let day_end = format!("{} 23:59:59", date.format("%Y-%m-%d"));

    let mut appointments = vec![];
    match professional_id {
        Some(pro) => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments
                 WHERE tenant_id = ?1 AND professional_id = ?2
                   AND start_time >= ?3 AND start_time <= ?4
                 ORDER BY start_time ASC"
            ))?;
            let rows = stmt.query_map(
                params![tenant_id, pro, day_start, day_end],
                parse_appointment_row,
            )?;
            for row in rows {
                appointments.push(row?);
            }
        }
        None => {
            let mut stmt = conn.prepare(&format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments
                 WHERE tenant_id = ?1 AND start_time >= ?2 AND start_time <= ?3
                 ORDER BY start_time ASC"
            ))?;
            let rows = stmt.query_map(params![tenant_id, day_start, day_end], parse_appointment_row)?;
            for row in rows {
                appointments.push(row?);
            }
        }
    }
    Ok(appointments)
}

pub fn get_appointment_by_id(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
) -> anyhow::Result<Option<Appointment>> {
    let result = conn.query_row(
        &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = ?1 AND tenant_id = ?2"),
        params![id, tenant_id],
        parse_appointment_row,
    );

    match result {
        Ok(appt) => Ok(Some(appt)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_appointment_status(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
    status: &AppointmentStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3 AND tenant_id = ?4",
        params![
            status.as_str(),
            fmt_dt(&Utc::now().naive_utc()),
            id,
            tenant_id
        ],
    )?;
    Ok(count > 0)
}

/// Booked intervals for one professional on one date, cancelled
/// appointments excluded. This is the single place bookings are scoped by
/// professional; the availability engine consumes the result as-is.
pub fn booked_intervals_on(
    conn: &Connection,
    tenant_id: &str,
    professional_id: &str,
    date: NaiveDate,
) -> anyhow::Result<Vec<BookedInterval>> {
    let day_start = format!("{} 00:00:00", date.format("%Y-%m-%d"));
    let day_end = format!("{} 23:59:59", date.format("%Y-%m-%d"));

    let mut stmt = conn.prepare(
        "SELECT start_time, end_time FROM appointments
         WHERE tenant_id = ?1 AND professional_id = ?2
           AND start_time >= ?3 AND start_time <= ?4 AND status != 'cancelled'
         ORDER BY start_time ASC",
    )?;

    let rows = stmt.query_map(
        params![tenant_id, professional_id, day_start, day_end],
        |row| {
            let start: String = row.get(0)?;
            let end: String = row.get(1)?;
            Ok(BookedInterval {
                start: parse_dt(&start),
                end: parse_dt(&end),
            })
        },
    )?;

    let mut intervals = vec![];
    for row in rows {
        intervals.push(row?);
    }
    Ok(intervals)
}

// ── Financial Entries ──

pub fn create_financial_entry(conn: &Connection, entry: &FinancialEntry) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO financial_entries (id, tenant_id, entry_type, description, amount_cents,
             entry_date, appointment_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.id,
            entry.tenant_id,
            entry.entry_type.as_str(),
            entry.description,
            entry.amount_cents,
            entry.entry_date.format("%Y-%m-%d").to_string(),
            entry.appointment_id,
            fmt_dt(&entry.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_financial_entries_in_range(
    conn: &Connection,
    tenant_id: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> anyhow::Result<Vec<FinancialEntry>> {
    let mut stmt = conn.prepare(
        "SELECT id, tenant_id, entry_type, description, amount_cents, entry_date, appointment_id, created_at
         FROM financial_entries
         WHERE tenant_id = ?1 AND entry_date >= ?2 AND entry_date <= ?3
         ORDER BY entry_date ASC, created_at ASC",
    )?;

    let rows = stmt.query_map(
        params![
            tenant_id,
            from.format("%Y-%m-%d").to_string(),
            to.format("%Y-%m-%d").to_string()
        ],
        |row| {
            let entry_type: String = row.get(2)?;
            let entry_date: String = row.get(5)?;
            let created_at: String = row.get(7)?;
            Ok(FinancialEntry {
                id: row.get(0)?,
                tenant_id: row.get(1)?,
                entry_type: EntryType::parse(&entry_type),
                description: row.get(3)?,
                amount_cents: row.get(4)?,
                entry_date: NaiveDate::parse_from_str(&entry_date, "%Y-%m-%d")
                    .unwrap_or_else(|_| Utc::now().date_naive()),
                appointment_id: row.get(6)?,
                created_at: parse_dt(&created_at),
            })
        },
    )?;

    let mut entries = vec![];
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}
