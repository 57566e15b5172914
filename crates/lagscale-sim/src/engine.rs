//! Discrete-time multi-server queue.
//!
//! `MmsEngine` advances one substep per `progress` call:
//!
//! ```text
//! arrivals  ~ Poisson(lambda(t))        → join the FIFO queue
//! free slots = servers - in_service     → take from the queue head
//! each in service completes w.p. 1 - exp(-mu(t))
//! response   = t + 1 - arrival_substep  (in substeps)
//! ```
//!
//! Customers already in service are never preempted when the server count
//! drops; the excess simply drains.

use std::collections::VecDeque;

use lagscale_core::Rate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest Poisson mean sampled in one Knuth pass before `exp(-mean)`
/// loses precision.
const POISSON_CHUNK: f64 = 30.0;

/// What one substep of the queue produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Progress {
    /// Customers that arrived this substep.
    pub arrivals: u64,
    /// Engine-specific value, not interpreted by the driver.
    pub opaque: u64,
    /// Customers waiting (not in service) after the substep.
    pub queue_length: u64,
    /// Response time of every customer that completed, in substeps.
    pub response_times: Vec<f64>,
}

/// A queue the driver can step one substep at a time.
pub trait QueueEngine {
    fn progress(&mut self, servers: u32) -> Progress;
}

impl<E: QueueEngine + ?Sized> QueueEngine for Box<E> {
    fn progress(&mut self, servers: u32) -> Progress {
        (**self).progress(servers)
    }
}

/// Seeded M/M/s queue driven by per-substep rate functions.
pub struct MmsEngine<L, M> {
    rng: StdRng,
    lambda: L,
    mu: M,
    /// Current substep.
    t: u64,
    /// Arrival substeps of waiting customers, oldest first.
    waiting: VecDeque<u64>,
    /// Arrival substeps of customers in service.
    in_service: Vec<u64>,
}

impl<L: Rate, M: Rate> MmsEngine<L, M> {
    pub fn new(seed: u64, lambda: L, mu: M) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            lambda,
            mu,
            t: 0,
            waiting: VecDeque::new(),
            in_service: Vec::new(),
        }
    }

    /// Substeps simulated so far.
    pub fn now(&self) -> u64 {
        self.t
    }

    pub fn in_service(&self) -> usize {
        self.in_service.len()
    }

    fn sample_poisson(&mut self, mean: f64) -> u64 {
        if !mean.is_finite() || mean <= 0.0 {
            return 0;
        }
        let mut remaining = mean;
        let mut count = 0;
        while remaining > 0.0 {
            let chunk = remaining.min(POISSON_CHUNK);
            count += knuth_poisson(&mut self.rng, chunk);
            remaining -= chunk;
        }
        count
    }
}

fn knuth_poisson(rng: &mut StdRng, mean: f64) -> u64 {
    let limit = (-mean).exp();
    let mut product: f64 = rng.gen_range(0.0..1.0);
    let mut count = 0;
    while product > limit {
        product *= rng.gen_range(0.0..1.0);
        count += 1;
    }
    count
}

impl<L: Rate, M: Rate> QueueEngine for MmsEngine<L, M> {
    fn progress(&mut self, servers: u32) -> Progress {
        let now = self.t;
        let lambda = self.lambda.at(now);
        let mu = self.mu.at(now);

        let arrivals = self.sample_poisson(lambda);
        self.waiting.extend(std::iter::repeat_n(now, arrivals as usize));

        while self.in_service.len() < servers as usize {
            match self.waiting.pop_front() {
                Some(arrived) => self.in_service.push(arrived),
                None => break,
            }
        }

        let p_complete = if mu.is_finite() && mu > 0.0 {
            1.0 - (-mu).exp()
        } else {
            0.0
        };
        let mut response_times = Vec::new();
        let rng = &mut self.rng;
        self.in_service.retain(|&arrived| {
            if rng.gen_bool(p_complete) {
                response_times.push((now + 1 - arrived) as f64);
                false
            } else {
                true
            }
        });

        self.t += 1;
        Progress {
            arrivals,
            opaque: self.in_service.len() as u64,
            queue_length: self.waiting.len() as u64,
            response_times,
        }
    }
}
