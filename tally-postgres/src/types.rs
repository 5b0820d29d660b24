//! Type conversions between tally values and PostgreSQL.

use chrono::{DateTime, NaiveDateTime, Utc};
use tally_migrate::{SqlRow, SqlValue};
use tokio_postgres::Row;
use tokio_postgres::types::{ToSql, Type};

use crate::error::{PgError, PgResult};

/// Convert a SqlValue to a type that can be used as a PostgreSQL parameter.
pub fn to_sql(value: &SqlValue) -> Box<dyn ToSql + Sync + Send> {
    match value {
        SqlValue::Null => Box::new(Option::<String>::None),
        SqlValue::BigInt(i) => Box::new(*i),
        SqlValue::Text(s) => Box::new(s.clone()),
        SqlValue::Timestamp(ts) => Box::new(*ts),
    }
}

/// Convert values to PostgreSQL parameters.
pub fn to_params(values: &[SqlValue]) -> Vec<Box<dyn ToSql + Sync + Send>> {
    values.iter().map(to_sql).collect()
}

/// Column types the adapter knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Text,
    SmallInt,
    Int,
    BigInt,
    Timestamp,
    TimestampTz,
}

impl ColumnKind {
    pub(crate) fn of(ty: &Type) -> Option<Self> {
        match *ty {
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => Some(Self::Text),
            Type::INT2 => Some(Self::SmallInt),
            Type::INT4 => Some(Self::Int),
            Type::INT8 => Some(Self::BigInt),
            Type::TIMESTAMP => Some(Self::Timestamp),
            Type::TIMESTAMPTZ => Some(Self::TimestampTz),
            _ => None,
        }
    }
}

/// Decode a driver row into a [`SqlRow`], columns in select order.
pub fn decode_row(row: &Row) -> PgResult<SqlRow> {
    let mut values = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let kind = ColumnKind::of(column.type_()).ok_or_else(|| {
            PgError::type_conversion(format!(
                "unsupported type {} for column {}",
                column.type_(),
                column.name()
            ))
        })?;

        let value = match kind {
            ColumnKind::Text => row.try_get::<_, Option<String>>(idx)?.map(SqlValue::Text),
            ColumnKind::SmallInt => row
                .try_get::<_, Option<i16>>(idx)?
                .map(|v| SqlValue::BigInt(v.into())),
            ColumnKind::Int => row
                .try_get::<_, Option<i32>>(idx)?
                .map(|v| SqlValue::BigInt(v.into())),
            ColumnKind::BigInt => row.try_get::<_, Option<i64>>(idx)?.map(SqlValue::BigInt),
            ColumnKind::Timestamp => row
                .try_get::<_, Option<NaiveDateTime>>(idx)?
                .map(SqlValue::Timestamp),
            ColumnKind::TimestampTz => row
                .try_get::<_, Option<DateTime<Utc>>>(idx)?
                .map(|v| SqlValue::Timestamp(v.naive_utc())),
        };
        values.push(value.unwrap_or(SqlValue::Null));
    }
    Ok(SqlRow::new(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_params() {
        let params = to_params(&[
            SqlValue::from("core"),
            SqlValue::from(3_i64),
            SqlValue::Null,
        ]);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_column_kinds() {
        assert_eq!(ColumnKind::of(&Type::BPCHAR), Some(ColumnKind::Text));
        assert_eq!(ColumnKind::of(&Type::VARCHAR), Some(ColumnKind::Text));
        assert_eq!(ColumnKind::of(&Type::INT8), Some(ColumnKind::BigInt));
        assert_eq!(ColumnKind::of(&Type::TIMESTAMP), Some(ColumnKind::Timestamp));
        assert_eq!(ColumnKind::of(&Type::JSONB), None);
        assert_eq!(ColumnKind::of(&Type::BOOL), None);
    }
}
