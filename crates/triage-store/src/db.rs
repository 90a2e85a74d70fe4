use rusqlite::{Connection, Result};

/// Initialise all tables. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_user_tables(conn)?;
    create_support_tables(conn)?;
    create_domain_tables(conn)?;
    Ok(())
}

fn create_user_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            user_id     INTEGER PRIMARY KEY,
            username    TEXT,
            first_name  TEXT,
            last_name   TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS roles (
            role_id     INTEGER PRIMARY KEY AUTOINCREMENT,
            role_name   TEXT NOT NULL UNIQUE
        );
        CREATE TABLE IF NOT EXISTS user_roles (
            user_id     INTEGER NOT NULL,
            role_id     INTEGER NOT NULL,
            UNIQUE(user_id, role_id)
        );",
    )
}

fn create_support_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS support_tickets (
            ticket_id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id            INTEGER NOT NULL,
            closed             INTEGER NOT NULL DEFAULT 0,
            messages_forwarded INTEGER NOT NULL DEFAULT 0,
            support_issue      TEXT,
            lang               TEXT,
            created_at         TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tickets_user
            ON support_tickets(user_id, closed);
        CREATE TABLE IF NOT EXISTS support_messages (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            ticket_id   INTEGER NOT NULL,
            user_id     INTEGER NOT NULL,
            message_id  INTEGER NOT NULL,
            user_text   TEXT NOT NULL,
            replied     INTEGER NOT NULL DEFAULT 0,
            is_deleted  INTEGER NOT NULL DEFAULT 0,
            created_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_messages_ticket
            ON support_messages(ticket_id, message_id);
        CREATE TABLE IF NOT EXISTS support_group_ids (
            user_id     INTEGER PRIMARY KEY,
            group_id    INTEGER NOT NULL,
            created_by  TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS support_user_muted (
            user_id     INTEGER PRIMARY KEY,
            muted_until TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS bot_settings (
            id               INTEGER PRIMARY KEY CHECK (id = 1),
            bot_username     TEXT NOT NULL,
            support_username TEXT NOT NULL
        );",
    )
}

/// Domain tables consulted for the operator dossier. Owned and written by
/// the shop side; we only read them.
fn create_domain_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS products (
            product_id  INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL UNIQUE,
            emoji       TEXT NOT NULL DEFAULT ''
        );
        CREATE TABLE IF NOT EXISTS cities (
            city_id     INTEGER PRIMARY KEY AUTOINCREMENT,
            city        TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS drops (
            drop_id      INTEGER PRIMARY KEY AUTOINCREMENT,
            client_id    INTEGER NOT NULL,
            product_name TEXT NOT NULL,
            status       TEXT NOT NULL,
            area_name    TEXT,
            batch_amount REAL NOT NULL DEFAULT 0,
            lost         INTEGER NOT NULL DEFAULT 0,
            city_id      INTEGER,
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_drops_client
            ON drops(client_id, status);
        CREATE TABLE IF NOT EXISTS redrop_reason (
            drop_id     INTEGER PRIMARY KEY,
            reason      TEXT NOT NULL
        );",
    )
}
