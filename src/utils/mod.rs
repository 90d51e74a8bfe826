use std::mem::transmute;

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use took::Timer;

pub mod logging;
pub mod validator;

/// Tolerance used when comparing penalties and deltas against zero.
pub const EPS5: f64 = 1e-5;
/// Tolerance used when comparing propagated arrival times.
pub const EPS7: f64 = 1e-7;

pub type Random = Pcg64Mcg;

pub fn create_seeded_rng(seed: i128) -> Random {
    let raw_bytes: [u8; 16] = unsafe { transmute(seed) };
    let mut rng = Pcg64Mcg::from_seed(raw_bytes);
    // discard the first three
    rng.next_u64();
    rng.next_u64();
    rng.next_u64();
    rng
}

pub enum TimeLimit {
    Seconds(u64),
    None,
}

impl TimeLimit {
    pub fn from_seconds(seconds: Option<u64>) -> Self {
        match seconds {
            Some(value) => Self::Seconds(value),
            None => Self::None,
        }
    }
}

pub struct Countdown {
    start: Timer,
    time_limit: TimeLimit,
}

impl Countdown {
    pub fn new(start: Timer, limit: TimeLimit) -> Self {
        Self {
            start,
            time_limit: limit,
        }
    }

    pub fn empty() -> Self {
        Self {
            start: Timer::new(),
            time_limit: TimeLimit::None,
        }
    }

    pub fn time_remaining(&self) -> u64 {
        if let TimeLimit::Seconds(value) = self.time_limit {
            let duration = self.start.took().as_std().as_secs();
            if duration > value {
                0
            } else {
                value - duration
            }
        } else {
            u64::MAX
        }
    }

    pub fn is_finished(&self) -> bool {
        self.time_remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn seeded_rng_is_reproducible() {
        let mut a = create_seeded_rng(4711);
        let mut b = create_seeded_rng(4711);
        for _ in 0..32 {
            assert_eq!(a.gen_range(0..1000), b.gen_range(0..1000));
        }
    }

    #[test]
    fn countdown_without_limit_never_finishes() {
        let countdown = Countdown::empty();
        assert!(!countdown.is_finished());
        assert_eq!(countdown.time_remaining(), u64::MAX);
    }

    #[test]
    fn countdown_with_zero_seconds_is_finished() {
        let countdown = Countdown::new(Timer::new(), TimeLimit::Seconds(0));
        assert!(countdown.is_finished());
        assert!(matches!(TimeLimit::from_seconds(None), TimeLimit::None));
        assert!(!Countdown::new(Timer::new(), TimeLimit::from_seconds(Some(60))).is_finished());
    }
}
