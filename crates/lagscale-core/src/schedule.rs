//! Piecewise-constant rate schedules.
//!
//! A schedule is written as `v0[,t1,v1,t2,v2,...]`: the first value applies
//! from tick 0, and each following `(t, v)` pair switches to `v` at tick `t`.
//!
//! ```text
//! "1.0,5,2.0,10,3.0"
//!   t in [0, 5)   → 1.0
//!   t in [5, 10)  → 2.0
//!   t >= 10       → 3.0
//! ```

use std::str::FromStr;

use crate::error::{ScheduleError, ScheduleResult};

/// Anything that yields a rate for a discrete time index.
pub trait Rate {
    fn at(&self, t: u64) -> f64;
}

/// One constant piece of a schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// First tick this segment applies to.
    pub start: i64,
    /// Rate while the segment applies.
    pub value: f64,
}

/// A piecewise-constant function of the tick index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateSchedule {
    segments: Vec<Segment>,
}

impl RateSchedule {
    /// Build a schedule directly from segments.
    ///
    /// Segments must already be ordered by strictly increasing `start`.
    pub fn from_segments(segments: Vec<Segment>) -> ScheduleResult<Self> {
        for (position, segment) in segments.iter().enumerate() {
            check_rate(position, segment.value)?;
        }
        for (i, pair) in segments.windows(2).enumerate() {
            if pair[1].start <= pair[0].start {
                return Err(ScheduleError::NonIncreasingBreakpoint {
                    position: i + 1,
                    previous: pair[0].start,
                    breakpoint: pair[1].start,
                });
            }
        }
        Ok(Self { segments })
    }

    /// A schedule that returns `value` for every tick.
    pub fn constant(value: f64) -> Self {
        Self {
            segments: vec![Segment { start: 0, value }],
        }
    }

    /// Parse the compact `v0[,t1,v1,...]` encoding.
    ///
    /// Every token must be a real number; the first one that is not aborts
    /// the whole parse. Breakpoints are truncated toward zero. A trailing
    /// breakpoint with no value after it is ignored.
    pub fn parse(input: &str) -> ScheduleResult<Self> {
        let mut numbers = Vec::new();
        for (position, token) in input.split(',').enumerate() {
            let token = token.trim();
            let value = token
                .parse::<f64>()
                .map_err(|_| ScheduleError::InvalidToken {
                    position,
                    token: token.to_string(),
                })?;
            numbers.push(value);
        }

        let mut segments = Vec::with_capacity(numbers.len() / 2 + 1);
        let mut previous: Option<i64> = None;
        // Token 0 is a value with an implicit breakpoint at 0; after that,
        // tokens alternate breakpoint, value.
        let mut start = 0i64;
        let mut expect_value = true;
        for (position, number) in numbers.into_iter().enumerate() {
            if expect_value {
                check_rate(position, number)?;
                if let Some(prev) = previous
                    && start <= prev
                {
                    return Err(ScheduleError::NonIncreasingBreakpoint {
                        position: position - 1,
                        previous: prev,
                        breakpoint: start,
                    });
                }
                segments.push(Segment {
                    start,
                    value: number,
                });
                previous = Some(start);
            } else {
                if !number.is_finite() {
                    return Err(ScheduleError::InvalidToken {
                        position,
                        token: number.to_string(),
                    });
                }
                start = number.trunc() as i64;
            }
            expect_value = !expect_value;
        }

        Ok(Self { segments })
    }

    /// Value of the last segment starting at or before `t`, or 0.0 when
    /// `t` precedes every segment.
    pub fn evaluate(&self, t: i64) -> f64 {
        let mut value = 0.0;
        for segment in &self.segments {
            if segment.start > t {
                break;
            }
            value = segment.value;
        }
        value
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn check_rate(position: usize, value: f64) -> ScheduleResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ScheduleError::InvalidRate { position, value });
    }
    Ok(())
}

impl FromStr for RateSchedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Rate for RateSchedule {
    fn at(&self, t: u64) -> f64 {
        self.evaluate(i64::try_from(t).unwrap_or(i64::MAX))
    }
}

/// Rescales a per-unit-time rate to substeps of length `dt`.
///
/// Substep `t` reads the underlying rate at tick `floor(t * dt)` and scales
/// it by `dt`, so a rate `r` becomes `r * dt` expected events per substep.
#[derive(Debug, Clone)]
pub struct Discretized<R> {
    inner: R,
    dt: f64,
}

impl<R: Rate> Discretized<R> {
    pub fn new(inner: R, dt: f64) -> Self {
        Self { inner, dt }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }
}

impl<R: Rate> Rate for Discretized<R> {
    fn at(&self, t: u64) -> f64 {
        let tick = (t as f64 * self.dt) as u64;
        self.inner.at(tick) * self.dt
    }
}

impl<R: Rate + ?Sized> Rate for Box<R> {
    fn at(&self, t: u64) -> f64 {
        (**self).at(t)
    }
}
