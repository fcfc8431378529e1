//! Binding `sea-query` values as `may_postgres` parameters.
//!
//! `sea-query` builds a statement plus a `Values` list; `may_postgres` wants `&[&dyn ToSql]`.
//! The conversion runs in two passes: first every value is moved into typed storage, then
//! references into that storage are handed to the closure, so they stay valid for exactly as
//! long as the statement runs.
//!
//! NULLs keep their column type (`Option<f64>` for a `Double`, `Option<String>` for a
//! `String`, ...) because the driver type-checks parameters even when the value is NULL.

use crate::error::StoreError;
use may_postgres::types::ToSql;
use sea_query::{Value, Values};

/// Typed storage for one statement's parameters.
#[derive(Default)]
struct ParamSlots {
    bools: Vec<Option<bool>>,
    ints: Vec<Option<i32>>,
    big_ints: Vec<Option<i64>>,
    doubles: Vec<Option<f64>>,
    strings: Vec<Option<String>>,
}

enum Slot {
    Bool(usize),
    Int(usize),
    BigInt(usize),
    Double(usize),
    String(usize),
}

impl ParamSlots {
    fn push(&mut self, value: &Value) -> Result<Slot, StoreError> {
        let slot = match value {
            Value::Bool(v) => {
                self.bools.push(*v);
                Slot::Bool(self.bools.len() - 1)
            }
            Value::TinyInt(v) => self.push_int(v.map(i32::from)),
            Value::SmallInt(v) => self.push_int(v.map(i32::from)),
            Value::Int(v) => self.push_int(*v),
            Value::BigInt(v) => self.push_big_int(*v),
            Value::Float(v) => self.push_double(v.map(f64::from)),
            Value::Double(v) => self.push_double(*v),
            Value::String(v) => {
                self.strings.push(v.clone());
                Slot::String(self.strings.len() - 1)
            }
            other => {
                return Err(StoreError::Query(format!(
                    "Unsupported value type in query: {other:?}"
                )))
            }
        };
        Ok(slot)
    }

    fn push_int(&mut self, v: Option<i32>) -> Slot {
        self.ints.push(v);
        Slot::Int(self.ints.len() - 1)
    }

    fn push_big_int(&mut self, v: Option<i64>) -> Slot {
        self.big_ints.push(v);
        Slot::BigInt(self.big_ints.len() - 1)
    }

    fn push_double(&mut self, v: Option<f64>) -> Slot {
        self.doubles.push(v);
        Slot::Double(self.doubles.len() - 1)
    }

    fn get(&self, slot: &Slot) -> &dyn ToSql {
        match *slot {
            Slot::Bool(i) => &self.bools[i] as &dyn ToSql,
            Slot::Int(i) => &self.ints[i] as &dyn ToSql,
            Slot::BigInt(i) => &self.big_ints[i] as &dyn ToSql,
            Slot::Double(i) => &self.doubles[i] as &dyn ToSql,
            Slot::String(i) => &self.strings[i] as &dyn ToSql,
        }
    }
}

/// Convert `values` and run `f` with the bound parameter list.
///
/// # Errors
///
/// Returns `StoreError::Query` if a value type has no binding here, or whatever `f` returns.
pub fn with_converted_params<F, R>(values: &Values, f: F) -> Result<R, StoreError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, StoreError>,
{
    let mut storage = ParamSlots::default();
    let slots = values
        .iter()
        .map(|value| storage.push(value))
        .collect::<Result<Vec<_>, _>>()?;

    let params: Vec<&dyn ToSql> = slots.iter().map(|slot| storage.get(slot)).collect();
    f(&params)
}
