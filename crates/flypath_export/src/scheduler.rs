// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-frame pacing.
//!
//! Export waits on the scheduler between rendering a frame and capturing it.
//! Hosts with a display loop resolve it on the next refresh; headless hosts
//! can use one of the implementations below.

use std::future::Future;
use std::time::Duration;

use tokio::time::{interval, Interval, MissedTickBehavior};

/// Source of "next frame" suspension points
pub trait FrameScheduler {
    /// Resolve once the next frame may be captured
    fn next_frame(&mut self) -> impl Future<Output = ()>;
}

/// Yields to the runtime and continues immediately
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateScheduler;

impl FrameScheduler for ImmediateScheduler {
    fn next_frame(&mut self) -> impl Future<Output = ()> {
        tokio::task::yield_now()
    }
}

/// Paces frames at a fixed refresh rate
#[derive(Debug)]
pub struct IntervalScheduler {
    interval: Interval,
}

impl IntervalScheduler {
    /// Create a scheduler ticking `rate` times per second.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(rate: u32) -> Self {
        let mut interval = interval(Duration::from_secs_f64(1.0 / f64::from(rate.max(1))));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }
}

impl FrameScheduler for IntervalScheduler {
    fn next_frame(&mut self) -> impl Future<Output = ()> {
        async {
            self.interval.tick().await;
        }
    }
}
