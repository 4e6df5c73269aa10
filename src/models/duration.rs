//! Duration value
//!
//! A non-negative span of time measured in beats. Exact input (integers and
//! rationals) stays exact through addition, multiplication, subtraction and
//! division; as soon as a float takes part the result is a float.
//!
//! Floats are rounded to [`ROUND_DURATION_TO_N_DIGITS`] decimal digits on
//! construction so that sums like `0.1 + 0.2` compare equal to `0.3`.
//!
//! Subtraction that would go below zero raises
//! [`EventError::InvalidDuration`] instead of clamping. Exact arithmetic
//! whose numerator or denominator leaves the `i64` range falls back to a
//! float result.

use crate::errors::{EventError, Result};
use num_rational::Rational64;
use num_traits::{CheckedAdd, CheckedDiv, CheckedMul, CheckedSub};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

/// Number of decimal digits float durations are rounded to
pub const ROUND_DURATION_TO_N_DIGITS: i32 = 10;

/// Duration in beats
///
/// # Examples
/// ```
/// use chronon::Duration;
///
/// let half = Duration::from_ratio(1, 2).unwrap();
/// let total = half + Duration::from(1u32);
/// assert!(total.is_exact());
/// assert_eq!(total, Duration::from_ratio(3, 2).unwrap());
/// assert_eq!(total.to_f64(), 1.5);
/// ```
#[derive(Debug, Clone, Copy)]
pub enum Duration {
    /// Rational duration (integer or fraction input)
    Exact(Rational64),
    /// Floating point duration (rounded on construction)
    Float(f64),
}

fn round_float(value: f64) -> f64 {
    let factor = 10f64.powi(ROUND_DURATION_TO_N_DIGITS);
    let scaled = value * factor;
    // Values this large carry no fractional digits anymore
    if !scaled.is_finite() {
        return value;
    }
    let rounded = scaled.round() / factor;
    // Normalise negative zero so ordering via total_cmp stays consistent
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

fn is_negative(ratio: &Rational64) -> bool {
    // Ratio keeps the denominator positive after reduction
    *ratio.numer() < 0
}

/// Exact result of `exact`, or the rounded float result when it overflowed
fn exact_or_float(exact: Option<Rational64>, float: impl FnOnce() -> f64) -> Duration {
    match exact {
        Some(ratio) => Duration::Exact(ratio),
        None => {
            log::debug!("Exact duration arithmetic overflowed, continuing with floats");
            Duration::Float(round_float(float()))
        }
    }
}

impl Duration {
    /// Duration of length zero
    pub fn zero() -> Self {
        Duration::Exact(Rational64::from_integer(0))
    }

    /// Create an exact duration from an integer beat count
    pub fn from_integer(beats: i64) -> Result<Self> {
        Self::from_rational(Rational64::from_integer(beats))
    }

    /// Create an exact duration from numerator and denominator
    pub fn from_ratio(numerator: i64, denominator: i64) -> Result<Self> {
        if denominator == 0 {
            return Err(EventError::DivisionByZero(numerator.to_string()));
        }
        // Normalising the sign would negate i64::MIN
        if numerator == i64::MIN || denominator == i64::MIN {
            return Err(EventError::InvalidDuration(format!(
                "{}/{} is out of range",
                numerator, denominator
            )));
        }
        Self::from_rational(Rational64::new(numerator, denominator))
    }

    /// Create an exact duration from a rational number
    pub fn from_rational(ratio: Rational64) -> Result<Self> {
        if is_negative(&ratio) {
            return Err(EventError::InvalidDuration(format!(
                "{} is negative",
                ratio
            )));
        }
        Ok(Duration::Exact(ratio))
    }

    /// Create a float duration, rounded to [`ROUND_DURATION_TO_N_DIGITS`] digits
    pub fn from_f64(beats: f64) -> Result<Self> {
        let rounded = round_float(beats);
        if !rounded.is_finite() {
            return Err(EventError::InvalidDuration(format!("{} is not finite", beats)));
        }
        if rounded < 0.0 {
            return Err(EventError::InvalidDuration(format!("{} is negative", beats)));
        }
        Ok(Duration::Float(rounded))
    }

    /// Whether the duration is stored as an exact rational
    pub fn is_exact(&self) -> bool {
        matches!(self, Duration::Exact(_))
    }

    /// Whether the duration is zero
    pub fn is_zero(&self) -> bool {
        match self {
            Duration::Exact(ratio) => *ratio.numer() == 0,
            Duration::Float(value) => *value == 0.0,
        }
    }

    /// Convert to a plain float for numeric consumers
    pub fn to_f64(&self) -> f64 {
        match self {
            Duration::Exact(ratio) => *ratio.numer() as f64 / *ratio.denom() as f64,
            Duration::Float(value) => *value,
        }
    }

    /// Convert to a rational; floats are approximated
    pub fn to_rational(&self) -> Option<Rational64> {
        match self {
            Duration::Exact(ratio) => Some(*ratio),
            Duration::Float(value) => Rational64::approximate_float(*value),
        }
    }

    /// Subtract `other`, failing when the result would be negative
    pub fn checked_sub(self, other: impl Into<Duration>) -> Result<Duration> {
        let other = other.into();
        if self < other {
            return Err(EventError::InvalidDuration(format!(
                "{} - {} is negative",
                self, other
            )));
        }
        Ok(match (self, other) {
            (Duration::Exact(a), Duration::Exact(b)) => {
                exact_or_float(a.checked_sub(&b), || self.to_f64() - other.to_f64())
            }
            _ => Duration::Float(round_float(self.to_f64() - other.to_f64())),
        })
    }

    /// Divide by `other`, failing on a zero divisor
    pub fn checked_div(self, other: impl Into<Duration>) -> Result<Duration> {
        let other = other.into();
        if other.is_zero() {
            return Err(EventError::DivisionByZero(self.to_string()));
        }
        Ok(match (self, other) {
            (Duration::Exact(a), Duration::Exact(b)) => {
                exact_or_float(a.checked_div(&b), || self.to_f64() / other.to_f64())
            }
            _ => Duration::Float(round_float(self.to_f64() / other.to_f64())),
        })
    }

    /// Subtract `other`, returning zero instead of a negative duration
    pub fn saturating_sub(self, other: impl Into<Duration>) -> Duration {
        self.checked_sub(other).unwrap_or_else(|_| Duration::zero())
    }

    /// Absolute difference between two durations
    pub fn abs_diff(self, other: impl Into<Duration>) -> Duration {
        let other = other.into();
        if self >= other {
            self.saturating_sub(other)
        } else {
            other.saturating_sub(self)
        }
    }
}

impl Default for Duration {
    fn default() -> Self {
        Duration::zero()
    }
}

impl From<u32> for Duration {
    fn from(beats: u32) -> Self {
        Duration::Exact(Rational64::from_integer(beats as i64))
    }
}

impl TryFrom<i64> for Duration {
    type Error = EventError;

    fn try_from(beats: i64) -> Result<Self> {
        Duration::from_integer(beats)
    }
}

impl TryFrom<f64> for Duration {
    type Error = EventError;

    fn try_from(beats: f64) -> Result<Self> {
        Duration::from_f64(beats)
    }
}

impl TryFrom<Rational64> for Duration {
    type Error = EventError;

    fn try_from(ratio: Rational64) -> Result<Self> {
        Duration::from_rational(ratio)
    }
}

impl<T: Into<Duration>> Add<T> for Duration {
    type Output = Duration;

    fn add(self, other: T) -> Duration {
        let other = other.into();
        match (self, other) {
            (Duration::Exact(a), Duration::Exact(b)) => {
                exact_or_float(a.checked_add(&b), || self.to_f64() + other.to_f64())
            }
            _ => Duration::Float(round_float(self.to_f64() + other.to_f64())),
        }
    }
}

impl<T: Into<Duration>> AddAssign<T> for Duration {
    fn add_assign(&mut self, other: T) {
        *self = *self + other;
    }
}

impl<T: Into<Duration>> Mul<T> for Duration {
    type Output = Duration;

    fn mul(self, other: T) -> Duration {
        let other = other.into();
        match (self, other) {
            (Duration::Exact(a), Duration::Exact(b)) => {
                exact_or_float(a.checked_mul(&b), || self.to_f64() * other.to_f64())
            }
            _ => Duration::Float(round_float(self.to_f64() * other.to_f64())),
        }
    }
}

impl Sum for Duration {
    fn sum<I: Iterator<Item = Duration>>(iter: I) -> Self {
        iter.fold(Duration::zero(), |total, duration| total + duration)
    }
}

impl<'a> Sum<&'a Duration> for Duration {
    fn sum<I: Iterator<Item = &'a Duration>>(iter: I) -> Self {
        iter.fold(Duration::zero(), |total, duration| total + *duration)
    }
}

impl PartialEq for Duration {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Duration {}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Duration {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Duration::Exact(a), Duration::Exact(b)) => a.cmp(b),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Duration::Exact(ratio) if *ratio.denom() == 1 => write!(f, "{}", ratio.numer()),
            Duration::Exact(ratio) => write!(f, "{}/{}", ratio.numer(), ratio.denom()),
            Duration::Float(value) => write!(f, "{}", value),
        }
    }
}

/// Serialized form: integers and floats as numbers, fractions as "n/d" strings
#[derive(Deserialize)]
#[serde(untagged)]
enum DurationRepr {
    Integer(i64),
    Number(f64),
    Text(String),
}

fn parse_duration_text(text: &str) -> Result<Duration> {
    let invalid = || EventError::InvalidDuration(format!("can't parse '{}'", text));
    match text.split_once('/') {
        Some((numerator, denominator)) => {
            let numerator: i64 = numerator.trim().parse().map_err(|_| invalid())?;
            let denominator: i64 = denominator.trim().parse().map_err(|_| invalid())?;
            Duration::from_ratio(numerator, denominator)
        }
        None => {
            let trimmed = text.trim();
            if let Ok(integer) = trimmed.parse::<i64>() {
                Duration::from_integer(integer)
            } else {
                Duration::from_f64(trimmed.parse::<f64>().map_err(|_| invalid())?)
            }
        }
    }
}

impl Serialize for Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Duration::Exact(ratio) if *ratio.denom() == 1 => serializer.serialize_i64(*ratio.numer()),
            Duration::Exact(ratio) => {
                serializer.serialize_str(&format!("{}/{}", ratio.numer(), ratio.denom()))
            }
            Duration::Float(value) => serializer.serialize_f64(*value),
        }
    }
}

impl<'de> Deserialize<'de> for Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let duration = match DurationRepr::deserialize(deserializer)? {
            DurationRepr::Integer(integer) => Duration::from_integer(integer),
            DurationRepr::Number(number) => Duration::from_f64(number),
            DurationRepr::Text(text) => parse_duration_text(&text),
        };
        duration.map_err(serde::de::Error::custom)
    }
}
