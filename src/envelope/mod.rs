//! Envelopes
//!
//! An [`Envelope`] is a curve over time given by control points. It is
//! stored as a [`Consecution`] of point chronons: every chronon carries
//! the point's `"value"` and `"curve_shape"` parameters and lasts until the
//! next point, so the start time of a chronon is the time of its point.
//! The duration of the last chronon extends the envelope past its last
//! point.
//!
//! Values between two points follow the curve of the left point's shape
//! (see [`curve`]). Before the first point and after the last point the
//! envelope holds the nearest value. Points never start after 0: when the
//! first point is later, a point with the same value is put in front.
//!
//! Tempo envelopes store [`TempoPoint`]s as values; every numeric query
//! then works on the absolute tempo in beats per minute.
//!
//! Every edit rebuilds the point chronons from the curve, so cuts and
//! splits keep the interpolated value at their edges.

pub mod curve;

use crate::config::EventConfig;
use crate::errors::{EventError, Result};
use crate::events::{split_ranges, Chronon, Compound, Consecution, Event};
use crate::models::{Duration, ParameterValue, TempoPoint};
use serde::{Deserialize, Serialize};

/// Parameter holding a point's value
pub const VALUE_PARAMETER: &str = "value";

/// Parameter holding a point's curve shape
pub const CURVE_SHAPE_PARAMETER: &str = "curve_shape";

/// Control point at an absolute time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub time: Duration,
    pub value: f64,
    #[serde(default)]
    pub curve_shape: f64,
}

impl Point {
    pub fn new(time: impl Into<Duration>, value: f64) -> Self {
        Self {
            time: time.into(),
            value,
            curve_shape: 0.0,
        }
    }

    pub fn with_curve_shape(mut self, curve_shape: f64) -> Self {
        self.curve_shape = curve_shape;
        self
    }
}

/// How rebuilt points store their value
#[derive(Debug, Clone, Copy, PartialEq)]
enum ValueKind {
    Number,
    Tempo { reference: f64 },
}

impl ValueKind {
    fn to_parameter(self, value: f64) -> Result<ParameterValue> {
        match self {
            ValueKind::Number => Ok(ParameterValue::Number(value)),
            ValueKind::Tempo { reference } => {
                Ok(ParameterValue::Tempo(TempoPoint::new(value / reference, reference)?))
            }
        }
    }
}

/// Curve of control points
///
/// # Examples
/// ```
/// use chronon::{Duration, Envelope};
///
/// let envelope = Envelope::from_points(vec![
///     (Duration::from(0u32), 0.0),
///     (Duration::from(10u32), 1.0),
/// ])
/// .unwrap();
/// assert_eq!(envelope.value_at(5u32).unwrap(), 0.5);
/// assert_eq!(envelope.integrate_interval(0u32, 10u32).unwrap(), 5.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Consecution", into = "Consecution")]
pub struct Envelope {
    points: Consecution,
}

fn point_chronon(duration: Duration, value: ParameterValue, curve_shape: f64) -> Chronon {
    Chronon::new(duration)
        .with_parameter(VALUE_PARAMETER, value)
        .with_parameter(CURVE_SHAPE_PARAMETER, curve_shape)
}

/// Value of a non-empty point list whose first point lies at 0
fn value_in(points: &[Point], time: Duration) -> f64 {
    let last = points[points.len() - 1];
    if time >= last.time {
        return last.value;
    }
    let index = points
        .partition_point(|point| point.time <= time)
        .saturating_sub(1);
    let (left, right) = (points[index], points[index + 1]);
    let length = right.time.to_f64() - left.time.to_f64();
    let progress = (time.to_f64() - left.time.to_f64()) / length;
    curve::interpolate(left.value, right.value, left.curve_shape, progress)
}

/// Shape of the stored curve between `start` and `end` (inside one segment)
fn shape_between(points: &[Point], start: Duration, end: Duration) -> f64 {
    if start >= end {
        return 0.0;
    }
    let index = points
        .partition_point(|point| point.time <= start)
        .saturating_sub(1);
    match (points.get(index), points.get(index + 1)) {
        (Some(left), Some(right)) if right.time > left.time => {
            let length = right.time.to_f64() - left.time.to_f64();
            left.curve_shape * (end.to_f64() - start.to_f64()) / length
        }
        _ => 0.0,
    }
}

/// Points reproducing the curve between `start` and `end`, re-based to 0
///
/// The last point takes the value reached when arriving at `end`, so a
/// jump stored at `end` is left out.
fn points_between(points: &[Point], start: Duration, end: Duration) -> Result<Vec<Point>> {
    let mut knots = vec![Point::new(start, value_in(points, start))];
    knots.extend(
        points
            .iter()
            .filter(|point| point.time > start && point.time < end)
            .copied(),
    );
    let end_value = points
        .iter()
        .find(|point| point.time == end)
        .map(|point| point.value)
        .unwrap_or_else(|| value_in(points, end));
    knots.push(Point::new(end, end_value));

    for index in 0..knots.len() - 1 {
        knots[index].curve_shape = shape_between(points, knots[index].time, knots[index + 1].time);
    }
    for knot in knots.iter_mut() {
        knot.time = knot.time.checked_sub(start)?;
    }
    Ok(knots)
}

impl Envelope {
    /// Envelope without points; every query on it fails
    pub fn new() -> Self {
        Self::default()
    }

    /// Points with the default curve shape
    pub fn from_points<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Duration, f64)>,
    {
        Self::from_points_with(points, &EventConfig::default())
    }

    /// Points with `config.default_curve_shape`
    pub fn from_points_with<I>(points: I, config: &EventConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (Duration, f64)>,
    {
        Self::from_shaped_points(
            points
                .into_iter()
                .map(|(time, value)| (time, value, config.default_curve_shape)),
        )
    }

    /// Points given as `(time, value, curve_shape)`
    pub fn from_shaped_points<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Duration, f64, f64)>,
    {
        Self::assemble(
            points
                .into_iter()
                .map(|(time, value, curve_shape)| (time, ParameterValue::Number(value), curve_shape))
                .collect(),
            Duration::zero(),
        )
    }

    /// Tempo envelope with straight segments between the tempo points
    pub fn from_tempo_points<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Duration, TempoPoint)>,
    {
        Self::assemble(
            points
                .into_iter()
                .map(|(time, tempo)| (time, ParameterValue::Tempo(tempo), 0.0))
                .collect(),
            Duration::zero(),
        )
    }

    /// Tempo envelope with shaped segments
    pub fn from_shaped_tempo_points<I>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Duration, TempoPoint, f64)>,
    {
        Self::assemble(
            points
                .into_iter()
                .map(|(time, tempo, curve_shape)| (time, ParameterValue::Tempo(tempo), curve_shape))
                .collect(),
            Duration::zero(),
        )
    }

    /// Tempo envelope that leaves durations unchanged
    pub fn identity_tempo() -> Self {
        Self::identity_tempo_with(&EventConfig::default())
    }

    pub fn identity_tempo_with(config: &EventConfig) -> Self {
        let point = point_chronon(
            Duration::zero(),
            ParameterValue::Tempo(config.reference_tempo),
            0.0,
        );
        Self {
            points: Consecution::from_events(vec![Event::from(point)]),
        }
    }

    fn assemble(knots: Vec<(Duration, ParameterValue, f64)>, tail: Duration) -> Result<Self> {
        let mut children = Vec::with_capacity(knots.len() + 1);
        if let Some((first_time, first_value, _)) = knots.first() {
            if !first_time.is_zero() {
                log::debug!("Envelope starts at {}, adding a point at 0", first_time);
                children.push(Event::from(point_chronon(*first_time, first_value.clone(), 0.0)));
            }
        }
        for (index, (time, value, curve_shape)) in knots.iter().enumerate() {
            if !value.as_f64().is_some_and(f64::is_finite) || !curve_shape.is_finite() {
                return Err(EventError::InvalidPoint(format!(
                    "point at {} needs a finite value and curve shape",
                    time
                )));
            }
            let duration = match knots.get(index + 1) {
                Some((next, _, _)) => next.checked_sub(*time).map_err(|_| {
                    EventError::InvalidPoint(format!("point at {} comes after point at {}", next, time))
                })?,
                None => tail,
            };
            children.push(Event::from(point_chronon(duration, value.clone(), *curve_shape)));
        }
        Ok(Self {
            points: Consecution::from_events(children),
        })
    }

    fn rebuild(points: Vec<Point>, tail: Duration, kind: ValueKind) -> Result<Self> {
        let knots = points
            .into_iter()
            .map(|point| Ok((point.time, kind.to_parameter(point.value)?, point.curve_shape)))
            .collect::<Result<Vec<_>>>()?;
        Self::assemble(knots, tail)
    }

    fn value_kind(&self) -> ValueKind {
        let first = self
            .points
            .children()
            .first()
            .and_then(Event::as_chronon)
            .and_then(|chronon| chronon.parameter(VALUE_PARAMETER));
        match first {
            Some(ParameterValue::Tempo(tempo)) => ValueKind::Tempo {
                reference: tempo.reference,
            },
            _ => ValueKind::Number,
        }
    }

    /// All points with absolute times
    pub fn points(&self) -> Vec<Point> {
        let mut time = Duration::zero();
        self.points
            .children()
            .iter()
            .filter_map(Event::as_chronon)
            .map(|chronon| {
                let point = Point {
                    time,
                    value: chronon
                        .parameter(VALUE_PARAMETER)
                        .and_then(ParameterValue::as_f64)
                        .unwrap_or_default(),
                    curve_shape: chronon
                        .parameter(CURVE_SHAPE_PARAMETER)
                        .and_then(ParameterValue::as_f64)
                        .unwrap_or_default(),
                };
                time += chronon.duration();
                point
            })
            .collect()
    }

    fn non_empty_points(&self, operation: &'static str) -> Result<Vec<Point>> {
        let points = self.points();
        if points.is_empty() {
            return Err(EventError::EmptyEnvelope { operation });
        }
        Ok(points)
    }

    /// Duration past the last point
    fn tail(&self) -> Duration {
        self.points
            .children()
            .last()
            .map(Event::duration)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.points.duration()
    }

    pub fn as_consecution(&self) -> &Consecution {
        &self.points
    }

    pub fn into_consecution(self) -> Consecution {
        self.points
    }

    pub fn absolute_times(&self) -> Vec<Duration> {
        self.points.absolute_times()
    }

    pub fn value_tuple(&self) -> Vec<f64> {
        self.points().iter().map(|point| point.value).collect()
    }

    pub fn curve_shape_tuple(&self) -> Vec<f64> {
        self.points().iter().map(|point| point.curve_shape).collect()
    }

    /// Whether all points share one value (true without points)
    pub fn is_static(&self) -> bool {
        let values = self.value_tuple();
        values.windows(2).all(|pair| pair[0] == pair[1])
    }

    pub fn value_at(&self, time: impl Into<Duration>) -> Result<f64> {
        let points = self.non_empty_points("value_at")?;
        Ok(value_in(&points, time.into()))
    }

    /// Value at `time` in the form the points store it
    pub fn parameter_at(&self, time: impl Into<Duration>) -> Result<ParameterValue> {
        let value = self.value_at(time)?;
        self.value_kind().to_parameter(value)
    }

    /// Shape of the segment containing `time`; 0 after the last point
    pub fn curve_shape_at(&self, time: impl Into<Duration>) -> Result<f64> {
        let time = time.into();
        let points = self.non_empty_points("curve_shape_at")?;
        let index = points
            .partition_point(|point| point.time <= time)
            .saturating_sub(1);
        if index + 1 >= points.len() {
            return Ok(0.0);
        }
        Ok(points[index].curve_shape)
    }

    /// Stored point at exactly `time`
    pub fn point_at(&self, time: impl Into<Duration>) -> Result<Point> {
        let time = time.into();
        let points = self.non_empty_points("point_at")?;
        points
            .into_iter()
            .find(|point| point.time == time)
            .ok_or_else(|| EventError::PointNotFound(time.to_string()))
    }

    /// Stored `(time, value)` pairs with `start <= time < end`
    pub fn time_range_to_point_tuple(
        &self,
        start: impl Into<Duration>,
        end: impl Into<Duration>,
    ) -> Result<Vec<(Duration, f64)>> {
        let (start, end) = (start.into(), end.into());
        let points = self.non_empty_points("time_range_to_point_tuple")?;
        Ok(points
            .into_iter()
            .filter(|point| point.time >= start && point.time < end)
            .map(|point| (point.time, point.value))
            .collect())
    }

    /// Exact integral of the curve from `start` to `end`
    pub fn integrate_interval(
        &self,
        start: impl Into<Duration>,
        end: impl Into<Duration>,
    ) -> Result<f64> {
        let (start, end) = (start.into(), end.into());
        let points = self.non_empty_points("integrate_interval")?;
        if start > end {
            return Err(EventError::InvalidStartAndEnd {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        if start == end {
            return Ok(0.0);
        }
        let (start, end) = (start.to_f64(), end.to_f64());
        let mut total = 0.0;
        for pair in points.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            let (left_time, right_time) = (left.time.to_f64(), right.time.to_f64());
            let length = right_time - left_time;
            let (from, to) = (start.max(left_time), end.min(right_time));
            if length <= 0.0 || from >= to {
                continue;
            }
            let (from_value, to_value, curve_shape) = curve::sub_segment(
                left.value,
                right.value,
                left.curve_shape,
                (from - left_time) / length,
                (to - left_time) / length,
            );
            total += curve::integrate_segment(from_value, to_value, curve_shape, to - from);
        }
        let last = points[points.len() - 1];
        let last_time = last.time.to_f64();
        if end > last_time {
            total += last.value * (end - start.max(last_time));
        }
        Ok(total)
    }

    pub fn get_average_value(
        &self,
        start: impl Into<Duration>,
        end: impl Into<Duration>,
    ) -> Result<f64> {
        let (start, end) = (start.into(), end.into());
        if start == end {
            return Err(EventError::InvalidAverageRange(start.to_string()));
        }
        let integral = self.integrate_interval(start, end)?;
        Ok(integral / (end.to_f64() - start.to_f64()))
    }

    pub fn get_average_parameter(
        &self,
        start: impl Into<Duration>,
        end: impl Into<Duration>,
    ) -> Result<ParameterValue> {
        let average = self.get_average_value(start, end)?;
        self.value_kind().to_parameter(average)
    }

    /// Put a point on the curve at `time`
    ///
    /// Inside a segment the shape is divided between both halves, so the
    /// curve stays the same. Behind the last point the new point holds the
    /// last value; it lasts until the old end of the envelope, or for
    /// `append_duration` when it lies behind that end. Nothing happens when
    /// a point exists at `time` already.
    pub fn sample_at(
        &mut self,
        time: impl Into<Duration>,
        append_duration: impl Into<Duration>,
    ) -> Result<()> {
        let (time, append_duration) = (time.into(), append_duration.into());
        let mut points = self.non_empty_points("sample_at")?;
        if points.iter().any(|point| point.time == time) {
            return Ok(());
        }
        let tail = self.tail();
        let last = points[points.len() - 1];
        let new_tail = if time > last.time {
            let old_end = last.time + tail;
            points.push(Point::new(time, last.value));
            if time < old_end {
                old_end.checked_sub(time)?
            } else {
                append_duration
            }
        } else {
            let index = points
                .partition_point(|point| point.time <= time)
                .saturating_sub(1);
            let (left, right) = (points[index], points[index + 1]);
            let progress = (time.to_f64() - left.time.to_f64())
                / (right.time.to_f64() - left.time.to_f64());
            let value = curve::interpolate(left.value, right.value, left.curve_shape, progress);
            points[index].curve_shape = left.curve_shape * progress;
            points.insert(
                index + 1,
                Point::new(time, value).with_curve_shape(left.curve_shape * (1.0 - progress)),
            );
            tail
        };
        *self = Self::rebuild(points, new_tail, self.value_kind())?;
        Ok(())
    }

    /// Keep the curve between `start` and `end`, re-based to 0
    ///
    /// The result lasts `end - start`; behind the last point the curve
    /// holds its last value.
    pub fn cut_out(&mut self, start: impl Into<Duration>, end: impl Into<Duration>) -> Result<()> {
        let (start, end) = (start.into(), end.into());
        if start >= end {
            return Err(EventError::InvalidStartAndEnd {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        let points = self.non_empty_points("cut_out")?;
        let knots = points_between(&points, start, end)?;
        *self = Self::rebuild(knots, Duration::zero(), self.value_kind())?;
        Ok(())
    }

    /// Remove the curve between `start` and `end` and join the rest
    pub fn cut_off(&mut self, start: impl Into<Duration>, end: impl Into<Duration>) -> Result<()> {
        let (start, end) = (start.into(), end.into());
        if start > end {
            return Err(EventError::InvalidStartAndEnd {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        let points = self.non_empty_points("cut_off")?;
        let duration = self.duration();
        if start == end || start >= duration {
            return Ok(());
        }
        let removed = end.checked_sub(start)?;

        let mut knots = if start.is_zero() {
            Vec::new()
        } else {
            points_between(&points, Duration::zero(), start)?
        };
        let following: Vec<Point> = points
            .iter()
            .filter(|point| point.time > end)
            .copied()
            .collect();
        let next_time = following.first().map(|point| point.time).unwrap_or(end);
        knots.push(
            Point::new(start, value_in(&points, end))
                .with_curve_shape(shape_between(&points, end, next_time)),
        );
        for point in following {
            knots.push(Point {
                time: point.time.checked_sub(removed)?,
                ..point
            });
        }

        let last_time = points[points.len() - 1].time;
        let tail = if end < last_time {
            self.tail()
        } else {
            duration.saturating_sub(end)
        };
        *self = Self::rebuild(knots, tail, self.value_kind())?;
        Ok(())
    }

    /// Split into pieces that each reproduce their part of the curve
    pub fn split_at(&self, times: &[Duration]) -> Result<Vec<Envelope>> {
        let ranges = split_ranges(times, self.duration())?;
        if ranges.is_empty() {
            return Ok(vec![self.clone()]);
        }
        ranges
            .into_iter()
            .map(|(start, end)| {
                let mut piece = self.clone();
                piece.cut_out(start, end)?;
                Ok(piece)
            })
            .collect()
    }

    /// Hold the last value until the envelope lasts `duration`
    pub fn extend_until(&mut self, duration: impl Into<Duration>) -> Result<()> {
        let duration = duration.into();
        if duration <= self.duration() {
            return Ok(());
        }
        self.sample_at(duration, Duration::zero())
    }

    /// Append the points of `other` behind the envelope's end
    pub fn concatenate(&mut self, other: Envelope) -> Result<()> {
        let at = self.duration();
        self.concatenate_at(at, other)
    }

    /// Let the points of `other` start at `at`
    ///
    /// The envelope is first cut or extended so it ends at `at`.
    pub fn concatenate_at(&mut self, at: impl Into<Duration>, other: Envelope) -> Result<()> {
        let at = at.into();
        if self.is_empty() || at.is_zero() {
            *self = other;
            return Ok(());
        }
        let duration = self.duration();
        if duration > at {
            log::warn!(
                "Envelope lasting {} is truncated to {} before concatenation",
                duration,
                at
            );
            self.cut_out(Duration::zero(), at)?;
        } else if duration < at {
            log::debug!(
                "Envelope lasting {} is extended to {} before concatenation",
                duration,
                at
            );
            self.extend_until(at)?;
        }
        self.points
            .children_mut()
            .extend(other.points.into_children());
        Ok(())
    }

    /// Turn a relative envelope into an absolute one
    ///
    /// The time axis is stretched so the envelope lasts `duration`, and every
    /// value becomes `combine(base, value)`.
    pub fn resolve<F>(&self, duration: impl Into<Duration>, base: f64, combine: F) -> Result<Envelope>
    where
        F: Fn(f64, f64) -> f64,
    {
        let duration = duration.into();
        let own_duration = self.duration();
        let factor = if own_duration.is_zero() {
            Duration::zero()
        } else {
            duration.checked_div(own_duration)?
        };
        let points = self
            .points()
            .into_iter()
            .map(|point| Point {
                time: point.time * factor,
                value: combine(base, point.value),
                curve_shape: point.curve_shape,
            })
            .collect();
        Self::rebuild(points, self.tail() * factor, ValueKind::Number)
    }
}

impl TryFrom<Consecution> for Envelope {
    type Error = EventError;

    /// Accept a consecution whose children are all point chronons
    fn try_from(consecution: Consecution) -> Result<Self> {
        for (index, child) in consecution.children().iter().enumerate() {
            let chronon = child.as_chronon().ok_or_else(|| {
                EventError::InvalidPoint(format!("child {} is a {}, not a chronon", index, child.kind()))
            })?;
            let has_value = chronon
                .parameter(VALUE_PARAMETER)
                .and_then(ParameterValue::as_f64)
                .is_some_and(f64::is_finite);
            let shape_is_number = chronon
                .parameter(CURVE_SHAPE_PARAMETER)
                .map_or(true, |shape| shape.as_f64().is_some());
            if !has_value || !shape_is_number {
                return Err(EventError::InvalidPoint(format!(
                    "child {} needs a numeric '{}' parameter",
                    index, VALUE_PARAMETER
                )));
            }
        }
        Ok(Self {
            points: consecution,
        })
    }
}

impl From<Envelope> for Consecution {
    fn from(envelope: Envelope) -> Self {
        envelope.points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(value: u32) -> Duration {
        Duration::from(value)
    }

    fn f(value: f64) -> Duration {
        Duration::from_f64(value).unwrap()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {} but got {}",
            expected,
            actual
        );
    }

    fn ramp() -> Envelope {
        Envelope::from_points(vec![(d(0), 0.0), (d(10), 1.0)]).unwrap()
    }

    fn curved() -> Envelope {
        Envelope::from_shaped_points(vec![(d(0), 0.0, 3.0), (d(4), 2.0, -2.0), (d(8), 1.0, 0.0)])
            .unwrap()
    }

    #[test]
    fn test_value_at() {
        let envelope = ramp();
        assert_eq!(envelope.value_at(5u32).unwrap(), 0.5);
        assert_eq!(envelope.value_at(0u32).unwrap(), 0.0);
        assert_eq!(envelope.value_at(10u32).unwrap(), 1.0);
        assert_eq!(envelope.value_at(20u32).unwrap(), 1.0);
    }

    #[test]
    fn test_first_point_is_moved_to_zero() {
        let envelope = Envelope::from_points(vec![(d(2), 5.0), (d(4), 7.0)]).unwrap();
        assert_eq!(envelope.absolute_times(), vec![d(0), d(2), d(4)]);
        assert_eq!(envelope.value_at(1u32).unwrap(), 5.0);
        assert_eq!(envelope.value_at(3u32).unwrap(), 6.0);
    }

    #[test]
    fn test_decreasing_points_are_rejected() {
        let result = Envelope::from_points(vec![(d(2), 1.0), (d(1), 2.0)]);
        assert!(matches!(result, Err(EventError::InvalidPoint(_))));
        let result = Envelope::from_points(vec![(d(0), f64::NAN)]);
        assert!(matches!(result, Err(EventError::InvalidPoint(_))));
    }

    #[test]
    fn test_empty_envelope_queries_fail() {
        let mut envelope = Envelope::new();
        assert!(envelope.value_at(0u32).unwrap_err().is_empty_error());
        assert!(envelope.integrate_interval(0u32, 1u32).unwrap_err().is_empty_error());
        assert!(envelope.point_at(0u32).unwrap_err().is_empty_error());
        assert!(envelope.sample_at(1u32, 0u32).unwrap_err().is_empty_error());
        assert!(envelope.is_static());
    }

    #[test]
    fn test_jump_between_points_at_same_time() {
        let envelope =
            Envelope::from_points(vec![(d(0), 1.0), (d(2), 1.0), (d(2), 3.0), (d(4), 3.0)]).unwrap();
        assert_eq!(envelope.value_at(f(1.9)).unwrap(), 1.0);
        assert_eq!(envelope.value_at(2u32).unwrap(), 3.0);
        assert_close(envelope.integrate_interval(0u32, 4u32).unwrap(), 8.0);
    }

    #[test]
    fn test_curve_shape_at() {
        let envelope = curved();
        assert_eq!(envelope.curve_shape_at(1u32).unwrap(), 3.0);
        assert_eq!(envelope.curve_shape_at(4u32).unwrap(), -2.0);
        assert_eq!(envelope.curve_shape_at(9u32).unwrap(), 0.0);
    }

    #[test]
    fn test_point_queries() {
        let envelope = curved();
        let point = envelope.point_at(4u32).unwrap();
        assert_eq!(point.value, 2.0);
        assert!(envelope.point_at(3u32).unwrap_err().is_not_found());
        assert_eq!(
            envelope.time_range_to_point_tuple(0u32, 8u32).unwrap(),
            vec![(d(0), 0.0), (d(4), 2.0)]
        );
    }

    #[test]
    fn test_integrate_interval() {
        let envelope = ramp();
        assert_close(envelope.integrate_interval(0u32, 10u32).unwrap(), 5.0);
        assert_close(envelope.integrate_interval(0u32, 5u32).unwrap(), 1.25);
        // Past the last point the curve holds its value
        assert_close(envelope.integrate_interval(5u32, 12u32).unwrap(), 3.75 + 2.0);
        assert_eq!(envelope.integrate_interval(3u32, 3u32).unwrap(), 0.0);
        assert!(matches!(
            envelope.integrate_interval(3u32, 2u32),
            Err(EventError::InvalidStartAndEnd { .. })
        ));
    }

    #[test]
    fn test_integrate_static_envelope() {
        let envelope = Envelope::from_points(vec![(d(0), 4.0)]).unwrap();
        assert!(envelope.is_static());
        assert_close(envelope.integrate_interval(2u32, 5u32).unwrap(), 12.0);
    }

    #[test]
    fn test_average_value() {
        let envelope = ramp();
        assert_close(envelope.get_average_value(0u32, 10u32).unwrap(), 0.5);
        assert!(matches!(
            envelope.get_average_value(1u32, 1u32),
            Err(EventError::InvalidAverageRange(_))
        ));
        assert_eq!(
            envelope.get_average_parameter(0u32, 10u32).unwrap(),
            ParameterValue::Number(0.5)
        );
    }

    #[test]
    fn test_sample_at_keeps_curve() {
        let mut envelope = curved();
        let sample_times = [0.5, 1.7, 3.2, 4.5, 6.1, 7.9, 9.0];
        let before: Vec<f64> = sample_times
            .iter()
            .map(|time| envelope.value_at(f(*time)).unwrap())
            .collect();

        envelope.sample_at(f(1.5), 0u32).unwrap();
        envelope.sample_at(6u32, 0u32).unwrap();
        assert_eq!(envelope.len(), 5);
        for (time, expected) in sample_times.iter().zip(before) {
            assert_close(envelope.value_at(f(*time)).unwrap(), expected);
        }
    }

    #[test]
    fn test_sample_at_behind_last_point() {
        let mut envelope = ramp();
        envelope.sample_at(12u32, 3u32).unwrap();
        assert_eq!(envelope.absolute_times(), vec![d(0), d(10), d(12)]);
        assert_eq!(envelope.duration(), d(15));
        assert_eq!(envelope.value_at(12u32).unwrap(), 1.0);
    }

    #[test]
    fn test_cut_out_keeps_edge_values() {
        let original = curved();
        let mut piece = original.clone();
        piece.cut_out(2u32, 6u32).unwrap();
        assert_eq!(piece.duration(), d(4));
        for step in 0..=8 {
            let local = f(step as f64 * 0.5);
            assert_close(
                piece.value_at(local).unwrap(),
                original.value_at(local + 2u32).unwrap(),
            );
        }
        assert_close(
            piece.integrate_interval(0u32, 4u32).unwrap(),
            original.integrate_interval(2u32, 6u32).unwrap(),
        );
    }

    #[test]
    fn test_cut_out_behind_last_point() {
        let mut envelope = ramp();
        envelope.cut_out(8u32, 14u32).unwrap();
        assert_eq!(envelope.duration(), d(6));
        assert_close(envelope.value_at(0u32).unwrap(), 0.8);
        assert_close(envelope.value_at(2u32).unwrap(), 1.0);
        assert_close(envelope.integrate_interval(0u32, 6u32).unwrap(), 1.8 + 4.0);
    }

    #[test]
    fn test_cut_off() {
        let mut envelope = ramp();
        envelope.cut_off(2u32, 6u32).unwrap();
        assert_eq!(envelope.duration(), d(6));
        assert_close(envelope.value_at(1u32).unwrap(), 0.1);
        assert_close(envelope.value_at(2u32).unwrap(), 0.6);
        assert_close(envelope.value_at(4u32).unwrap(), 0.8);

        let mut envelope = ramp();
        envelope.cut_off(20u32, 30u32).unwrap();
        assert_eq!(envelope, ramp());
    }

    #[test]
    fn test_split_at_preserves_continuity() {
        let original = curved();
        let pieces = original.split_at(&[d(3)]).unwrap();
        assert_eq!(pieces.len(), 2);
        assert_close(
            pieces[0].value_at(3u32).unwrap(),
            original.value_at(3u32).unwrap(),
        );
        assert_close(
            pieces[1].value_at(0u32).unwrap(),
            original.value_at(3u32).unwrap(),
        );
        let total: f64 = pieces[0].integrate_interval(0u32, 3u32).unwrap()
            + pieces[1].integrate_interval(0u32, 5u32).unwrap();
        assert_close(total, original.integrate_interval(0u32, 8u32).unwrap());
    }

    #[test]
    fn test_extend_until_and_concatenate() {
        let mut envelope = ramp();
        envelope.extend_until(12u32).unwrap();
        assert_eq!(envelope.duration(), d(12));

        let other = Envelope::from_points(vec![(d(0), 5.0), (d(2), 6.0)]).unwrap();
        envelope.concatenate(other).unwrap();
        assert_eq!(envelope.value_at(11u32).unwrap(), 1.0);
        assert_eq!(envelope.value_at(13u32).unwrap(), 5.5);
        assert_eq!(envelope.duration(), d(14));
    }

    #[test]
    fn test_concatenate_truncates_longer_envelope() {
        let mut envelope = ramp();
        let other = Envelope::from_points(vec![(d(0), 9.0)]).unwrap();
        envelope.concatenate_at(5u32, other).unwrap();
        assert_eq!(envelope.absolute_times(), vec![d(0), d(5), d(5)]);
        assert_eq!(envelope.value_at(4u32).unwrap(), 0.4);
        assert_eq!(envelope.value_at(5u32).unwrap(), 9.0);
    }

    #[test]
    fn test_tempo_points() {
        let slow = TempoPoint::new(30.0, 2.0).unwrap();
        let envelope = Envelope::from_tempo_points(vec![(d(0), slow), (d(2), slow)]).unwrap();
        assert_eq!(envelope.value_at(1u32).unwrap(), 60.0);
        assert_eq!(
            envelope.parameter_at(1u32).unwrap(),
            ParameterValue::Tempo(TempoPoint::new(30.0, 2.0).unwrap())
        );

        let identity = Envelope::identity_tempo();
        assert!(identity.is_static());
        assert_eq!(identity.value_at(100u32).unwrap(), 60.0);
    }

    #[test]
    fn test_resolve_relative_envelope() {
        let relative = Envelope::from_points(vec![(d(0), 0.0), (d(1), 12.0)]).unwrap();
        let absolute = relative.resolve(4u32, 60.0, |base, value| base + value).unwrap();
        assert_eq!(absolute.absolute_times(), vec![d(0), d(4)]);
        assert_eq!(absolute.value_at(2u32).unwrap(), 66.0);
    }

    #[test]
    fn test_try_from_consecution() {
        let valid = ramp().into_consecution();
        assert!(Envelope::try_from(valid).is_ok());

        let invalid = Consecution::from_events(vec![Event::from(Chronon::new(1u32))]);
        assert!(matches!(
            Envelope::try_from(invalid),
            Err(EventError::InvalidPoint(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip() {
        let envelope = curved();
        let yaml = serde_yaml::to_string(&envelope).unwrap();
        let parsed: Envelope = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, envelope);
    }
}
