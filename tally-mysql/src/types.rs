//! Type conversions between tally values and MySQL.

use chrono::{Datelike, NaiveDate, Timelike};
use mysql_async::{Params, Row, Value};
use tally_migrate::{SqlRow, SqlValue};

use crate::error::{MysqlError, MysqlResult};

/// Convert a SqlValue to a MySQL value.
pub fn to_mysql(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::BigInt(i) => Value::Int(*i),
        SqlValue::Text(s) => Value::Bytes(s.as_bytes().to_vec()),
        SqlValue::Timestamp(ts) => Value::Date(
            u16::try_from(ts.year()).unwrap_or(0),
            ts.month() as u8,
            ts.day() as u8,
            ts.hour() as u8,
            ts.minute() as u8,
            ts.second() as u8,
            ts.nanosecond() / 1_000 % 1_000_000,
        ),
    }
}

/// Convert values to positional statement parameters.
pub fn to_params(values: &[SqlValue]) -> Params {
    if values.is_empty() {
        Params::Empty
    } else {
        Params::Positional(values.iter().map(to_mysql).collect())
    }
}

/// Convert a MySQL value back into a SqlValue.
pub fn from_mysql(value: &Value) -> MysqlResult<SqlValue> {
    match value {
        Value::NULL => Ok(SqlValue::Null),
        Value::Int(i) => Ok(SqlValue::BigInt(*i)),
        Value::UInt(u) => i64::try_from(*u)
            .map(SqlValue::BigInt)
            .map_err(|_| MysqlError::type_conversion(format!("{} does not fit into BIGINT", u))),
        Value::Bytes(bytes) => String::from_utf8(bytes.clone())
            .map(SqlValue::Text)
            .map_err(|e| MysqlError::type_conversion(format!("invalid UTF-8 text: {}", e))),
        Value::Date(year, month, day, hour, minute, second, micro) => {
            NaiveDate::from_ymd_opt((*year).into(), (*month).into(), (*day).into())
                .and_then(|d| {
                    d.and_hms_micro_opt((*hour).into(), (*minute).into(), (*second).into(), *micro)
                })
                .map(SqlValue::Timestamp)
                .ok_or_else(|| MysqlError::type_conversion(format!("invalid datetime {:?}", value)))
        }
        other => Err(MysqlError::type_conversion(format!(
            "unsupported value {:?}",
            other
        ))),
    }
}

/// Decode a driver row into a [`SqlRow`], columns in select order.
pub fn decode_row(row: &Row) -> MysqlResult<SqlRow> {
    let mut values = Vec::with_capacity(row.len());
    for idx in 0..row.len() {
        let value = row
            .as_ref(idx)
            .ok_or_else(|| MysqlError::type_conversion(format!("column {} already taken", idx)))?;
        values.push(from_mysql(value)?);
    }
    Ok(SqlRow::new(values))
}
