//! Binding [`Value`] arguments and decoding rows of unknown shape.
//!
//! `SELECT *` returns whatever the table holds, so every column is tried
//! with a fixed sequence of Rust types until one decodes. Raw bytes are the
//! last resort and are normalized to text with the rest of the row.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rowsql_core::{Row, Value};
use serde_json::Value as JsonValue;
use sqlx::query::Query;
use sqlx::types::{Decimal, Json, Uuid};
use sqlx::{ColumnIndex, Decode, Encode, Type, ValueRef};

/// A query with the owned argument buffer of `DB`.
pub(crate) type DynQuery<'q, DB> = Query<'q, DB, <DB as sqlx::Database>::Arguments<'q>>;

/// Binds `args` in order.
pub(crate) fn bind_args<'q, DB>(mut query: DynQuery<'q, DB>, args: Vec<Value>) -> DynQuery<'q, DB>
where
    DB: sqlx::Database,
    Option<String>: Encode<'q, DB> + Type<DB>,
    bool: Encode<'q, DB> + Type<DB>,
    i64: Encode<'q, DB> + Type<DB>,
    f64: Encode<'q, DB> + Type<DB>,
    String: Encode<'q, DB> + Type<DB>,
    Vec<u8>: Encode<'q, DB> + Type<DB>,
    Json<JsonValue>: Encode<'q, DB> + Type<DB>,
{
    for arg in args {
        query = match arg {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(b),
            Value::Int(n) => query.bind(n),
            Value::Float(f) => query.bind(f),
            Value::Text(s) => query.bind(s),
            Value::Bytes(b) => query.bind(b),
            Value::Json(j) => query.bind(Json(j)),
        };
    }
    query
}

/// Engine-specific decoder tried before the common ones.
pub(crate) type ExtraDecode<R> = fn(&R, usize) -> Option<Value>;

macro_rules! try_column {
    ($row:expr, $idx:expr, $($ty:ty => $map:expr),+ $(,)?) => {
        $(
            if let Ok(v) = $row.try_get::<$ty, _>($idx) {
                return Ok($map(v));
            }
        )+
    };
}

/// Decodes every column of `row` into a normalized [`Row`].
pub(crate) fn decode_row<R>(row: &R, extra: ExtraDecode<R>) -> Result<Row, sqlx::Error>
where
    R: sqlx::Row,
    usize: ColumnIndex<R>,
    i64: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    i32: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    i16: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    bool: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    f64: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    f32: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    String: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    JsonValue: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    DateTime<Utc>: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    NaiveDateTime: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    NaiveDate: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    NaiveTime: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    Vec<u8>: for<'r> Decode<'r, R::Database> + Type<R::Database>,
{
    let mut values = Vec::with_capacity(row.len());
    for idx in 0..row.len() {
        if row.try_get_raw(idx)?.is_null() {
            values.push(Value::Null);
            continue;
        }
        if let Some(value) = extra(row, idx) {
            values.push(value);
            continue;
        }
        values.push(decode_column(row, idx)?);
    }
    Ok(Value::normalize_row(values))
}

fn decode_column<R>(row: &R, idx: usize) -> Result<Value, sqlx::Error>
where
    R: sqlx::Row,
    usize: ColumnIndex<R>,
    i64: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    i32: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    i16: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    bool: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    f64: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    f32: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    String: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    JsonValue: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    DateTime<Utc>: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    NaiveDateTime: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    NaiveDate: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    NaiveTime: for<'r> Decode<'r, R::Database> + Type<R::Database>,
    Vec<u8>: for<'r> Decode<'r, R::Database> + Type<R::Database>,
{
    try_column!(row, idx,
        i64 => Value::Int,
        i32 => |v: i32| Value::Int(i64::from(v)),
        i16 => |v: i16| Value::Int(i64::from(v)),
        bool => Value::Bool,
        f64 => Value::Float,
        f32 => |v: f32| Value::Float(f64::from(v)),
        String => Value::Text,
        JsonValue => Value::Json,
        DateTime<Utc> => timestamp_text,
        NaiveDateTime => naive_timestamp_text,
        NaiveDate => |v: NaiveDate| Value::Text(v.to_string()),
        NaiveTime => |v: NaiveTime| Value::Text(v.to_string()),
        Vec<u8> => Value::Bytes,
    );
    row.try_get_unchecked::<Vec<u8>, _>(idx).map(Value::Bytes)
}

/// Timestamps keep their offset and any fractional seconds.
fn timestamp_text(v: DateTime<Utc>) -> Value {
    Value::Text(v.to_rfc3339())
}

fn naive_timestamp_text(v: NaiveDateTime) -> Value {
    Value::Text(v.format("%Y-%m-%d %H:%M:%S%.f").to_string())
}

/// Decimals keep their scale, so `12.50` reads back as `12.50`.
fn decimal_text(v: Decimal) -> Value {
    Value::Text(v.to_string())
}

fn uuid_text(v: Uuid) -> Value {
    Value::Text(v.hyphenated().to_string())
}

fn unsigned(n: u64) -> Value {
    i64::try_from(n).map_or_else(|_| Value::Text(n.to_string()), Value::Int)
}

/// No engine-specific decoder.
pub(crate) fn no_extra<R>(_row: &R, _idx: usize) -> Option<Value> {
    None
}

/// PostgreSQL types with no portable counterpart.
pub(crate) fn postgres_extra(row: &sqlx::postgres::PgRow, idx: usize) -> Option<Value> {
    use sqlx::Row as _;

    if let Ok(v) = row.try_get::<Uuid, _>(idx) {
        return Some(uuid_text(v));
    }
    row.try_get::<Decimal, _>(idx).ok().map(decimal_text)
}

/// MySQL reports unsigned integers as a separate family.
pub(crate) fn mysql_extra(row: &sqlx::mysql::MySqlRow, idx: usize) -> Option<Value> {
    use sqlx::Row as _;

    if let Ok(n) = row.try_get::<u64, _>(idx) {
        return Some(unsigned(n));
    }
    row.try_get::<Decimal, _>(idx).ok().map(decimal_text)
}
