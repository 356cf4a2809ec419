use std::time::{Duration, Instant};

use log::debug;

use crate::chip::{Chip, ExecutionError, Keypad};

/// Instructions executed per timer tick unless configured otherwise.
pub const DEFAULT_STEPS_PER_TICK: u32 = 10;

/// The rate of the timer clock in Hz.
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Drives a chip with two nested cadences: a batch of instruction steps,
/// followed by one decrement of the timers. The instruction rate is thus
/// `steps_per_tick * tick_rate` and independent of the timer rate.
#[derive(Debug, Clone)]
pub struct Scheduler {
    steps_per_tick: u32,
    tick_interval: Duration,
}

impl Scheduler {
    /// Constructs a scheduler executing `steps_per_tick` instructions per
    /// tick, with `tick_rate` ticks per second. Both are clamped to at least 1.
    pub fn new(steps_per_tick: u32, tick_rate: u32) -> Self {
        Scheduler {
            steps_per_tick: steps_per_tick.max(1),
            tick_interval: Duration::from_secs(1) / tick_rate.max(1),
        }
    }

    pub fn steps_per_tick(&self) -> u32 {
        self.steps_per_tick
    }

    pub fn set_steps_per_tick(&mut self, steps_per_tick: u32) {
        self.steps_per_tick = steps_per_tick.max(1);
        debug!("Running {} steps per tick", self.steps_per_tick);
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Runs one tick: up to `steps_per_tick` instructions, then one timer
    /// decrement. The first fault ends the tick without touching the timers.
    pub fn run_tick<C: Chip>(&self, chip: &mut C, keypad: &Keypad) -> Result<(), ExecutionError> {
        for _ in 0..self.steps_per_tick {
            chip.cycle(keypad)?;
        }
        chip.tick();
        Ok(())
    }

    /// A tick source paced at this scheduler's tick rate, starting now.
    pub fn pacer(&self) -> Pacer {
        Pacer::new(self.tick_interval)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new(DEFAULT_STEPS_PER_TICK, DEFAULT_TICK_RATE)
    }
}

/// A fixed-rate tick source. Deadlines advance by exactly one interval per
/// tick so that sleeping jitter does not accumulate.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    next_deadline: Instant,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Pacer {
            interval,
            next_deadline: Instant::now() + interval,
        }
    }

    /// Blocks until the next tick is due.
    pub fn wait_for_next_tick(&mut self) {
        let now = Instant::now();
        if self.next_deadline > now {
            std::thread::sleep(self.next_deadline - now);
            self.next_deadline += self.interval;
        } else if now - self.next_deadline > self.interval {
            // more than a whole tick behind, e.g. after the host was suspended
            self.next_deadline = now + self.interval;
        } else {
            self.next_deadline += self.interval;
        }
    }
}
