use chrono::Utc;
use rusqlite::{ffi, params, params_from_iter, types::Value, Row};

use crate::db::backend::{FilterEmails, FilterUsers, FILTER_EMAILS_DEFAULT_LIMIT, FILTER_USERS_DEFAULT_LIMIT};
use crate::db::sqlite::connection::SqlitePool;
use crate::errors::{Error, Result, ERR_ALREADY_EXISTS, ERR_NOT_FOUND};
use crate::models::{Email, User};

/// Translate constraint violations into the well-known client errors
fn map_constraint(err: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        match failure.extended_code {
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                return ERR_ALREADY_EXISTS.clone();
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                return Error::wrap(ERR_NOT_FOUND.clone(), "referenced user does not exist");
            }
            _ => {}
        }
    }
    err.into()
}

fn limit_or(limit: u32, default: u32) -> i64 {
    if limit == 0 {
        default as i64
    } else {
        limit as i64
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        password: row.get(2)?,
        created: row.get(3)?,
        updated: row.get(4)?,
    })
}

fn email_from_row(row: &Row<'_>) -> rusqlite::Result<Email> {
    Ok(Email {
        id: row.get(0)?,
        user_id: row.get(1)?,
        address: row.get(2)?,
        created: row.get(3)?,
    })
}

pub fn add_user(pool: &SqlitePool, name: &str, password_hash: &str) -> Result<i64> {
    let conn = pool.get()?;
    let now = Utc::now();

    conn.execute(
        "INSERT INTO users (name, password, created, updated) VALUES (?1, ?2, ?3, ?4)",
        params![name, password_hash, now, now],
    )
    .map_err(map_constraint)?;

    Ok(conn.last_insert_rowid())
}

/// Delete a user and their emails in one transaction
pub fn delete_user(pool: &SqlitePool, user_id: i64) -> Result<()> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM emails WHERE user_id = ?1", params![user_id])?;
    let deleted = tx.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
    if deleted == 0 {
        return Err(ERR_NOT_FOUND.clone());
    }

    tx.commit()?;
    Ok(())
}

pub fn filter_users_id(pool: &SqlitePool, filter: &FilterUsers) -> Result<Vec<i64>> {
    let conn = pool.get()?;
    let limit = limit_or(filter.limit, FILTER_USERS_DEFAULT_LIMIT);
    let offset = filter.offset as i64;

    let ids = match &filter.email {
        Some(address) => {
            let mut stmt = conn.prepare(
                r#"
                SELECT DISTINCT u.id FROM users u
                JOIN emails e ON e.user_id = u.id
                WHERE e.address = ?1
                ORDER BY u.id
                LIMIT ?2 OFFSET ?3
                "#,
            )?;
            let ids = stmt
                .query_map(params![address, limit, offset], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            ids
        }
        None => {
            let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id LIMIT ?1 OFFSET ?2")?;
            let ids = stmt
                .query_map(params![limit, offset], |row| row.get(0))?
                .collect::<Result<Vec<i64>, _>>()?;
            ids
        }
    };

    Ok(ids)
}

pub fn fetch_users(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<User>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let conn = pool.get()?;
    let placeholders = vec!["?"; ids.len()].join(",");
    let sql = format!(
        "SELECT id, name, password, created, updated FROM users WHERE id IN ({}) ORDER BY id",
        placeholders
    );

    let mut stmt = conn.prepare(&sql)?;
    let users = stmt
        .query_map(params_from_iter(ids.iter()), user_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(users)
}

pub fn add_email(pool: &SqlitePool, user_id: i64, address: &str) -> Result<i64> {
    let conn = pool.get()?;

    conn.execute(
        "INSERT INTO emails (user_id, address, created) VALUES (?1, ?2, ?3)",
        params![user_id, address, Utc::now()],
    )
    .map_err(map_constraint)?;

    Ok(conn.last_insert_rowid())
}

pub fn delete_email(pool: &SqlitePool, email_id: i64) -> Result<()> {
    let conn = pool.get()?;
    let deleted = conn.execute("DELETE FROM emails WHERE id = ?1", params![email_id])?;
    if deleted == 0 {
        return Err(ERR_NOT_FOUND.clone());
    }
    Ok(())
}

pub fn filter_emails(pool: &SqlitePool, filter: &FilterEmails) -> Result<Vec<Email>> {
    let conn = pool.get()?;

    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(email_id) = filter.email_id {
        clauses.push("id = ?");
        values.push(Value::Integer(email_id));
    }
    if let Some(user_id) = filter.user_id {
        clauses.push("user_id = ?");
        values.push(Value::Integer(user_id));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    values.push(Value::Integer(limit_or(filter.limit, FILTER_EMAILS_DEFAULT_LIMIT)));
    values.push(Value::Integer(filter.offset as i64));

    let sql = format!(
        "SELECT id, user_id, address, created FROM emails {} ORDER BY id LIMIT ? OFFSET ?",
        where_clause
    );

    let mut stmt = conn.prepare(&sql)?;
    let emails = stmt
        .query_map(params_from_iter(values.iter()), email_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(emails)
}

pub fn test_connection(pool: &SqlitePool) -> Result<()> {
    let conn = pool.get()?;
    conn.query_row("SELECT 1", params![], |row| row.get::<_, i64>(0))?;
    Ok(())
}
