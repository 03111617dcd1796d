//! Row mapping for the document store tables.

use std::str::FromStr;

use rusqlite::{Connection, Params, Row, types::Type};

use crate::models::{AdminPermissions, IdType, User, UserRole};

pub const USER_COLS: &str =
    "id, username, id_type, password_hash, is_first_access, role, permissions, created_at";

pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

fn parse_enum<T: FromStr>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("unknown value '{}'", raw).into(),
        )
    })
}

impl FromRow for User {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let permissions: Option<String> = row.get(6)?;
        let permissions = permissions
            .map(|json| serde_json::from_str::<AdminPermissions>(&json))
            .transpose()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;

        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            id_type: parse_enum::<IdType>(row, 2)?,
            password_hash: row.get(3)?,
            is_first_access: row.get(4)?,
            role: parse_enum::<UserRole>(row, 5)?,
            permissions,
            created_at: row.get(7)?,
        })
    }
}

pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: impl Params,
) -> rusqlite::Result<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(T::from_row(row)?)),
        None => Ok(None),
    }
}

pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: impl Params,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, |row| T::from_row(row))?;
    rows.collect()
}
