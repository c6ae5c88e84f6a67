use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "usd";

//--------------------------------------       Cents         ---------------------------------------------------------
/// An amount of money in minor currency units (cents for USD).
///
/// Order totals are carried around as decimal currency values, because that is what customers submit. The payment
/// gateway only ever deals in minor units. [`Cents::from_decimal`] is the one and only place where decimal amounts are
/// converted to minor units. Don't roll your own conversion anywhere else.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, AddAssign, add_assign);

impl Mul<i64> for Cents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}${}.{:02}", abs / 100, abs % 100)
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Converts a decimal currency amount into minor units, rounding to the nearest cent (halves round away from
    /// zero).
    pub fn from_decimal(amount: f64) -> Result<Self, CentsConversionError> {
        if !amount.is_finite() {
            return Err(CentsConversionError(format!("{amount} is not a finite number")));
        }
        let minor = (amount * 100.0).round();
        if minor > i64::MAX as f64 || minor < i64::MIN as f64 {
            return Err(CentsConversionError(format!("{amount} is out of range")));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(minor as i64))
    }

    pub fn as_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}
