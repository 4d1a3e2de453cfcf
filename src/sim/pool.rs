//! Fixed-capacity object pool for balls.
//!
//! The registry stays the sole owner of *live* balls; the pool owns the
//! parked instances and the capacity policy. An instance is never live and
//! free-listed at the same time. Hitting capacity forcibly recycles the
//! oldest live ball instead of growing — bounded memory traded against the
//! correctness of that one instance, with a diagnostic log.

use crate::sim::ball::Ball;
use crate::sim::registry::Registry;

/// Free list plus capacity bookkeeping.
#[derive(Debug)]
pub struct BallPool {
    free: Vec<Ball>,
    /// Hard ceiling on instances ever constructed (live + free).
    capacity: usize,
    /// Instances constructed so far.
    created: usize,
}

impl BallPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
            created: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Parked instances.
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Hand out a reset instance with a fresh id. Never fails: at capacity
    /// with nothing parked, the oldest live ball is forcibly recycled.
    pub fn acquire(&mut self, registry: &mut Registry) -> Ball {
        if let Some(mut ball) = self.free.pop() {
            ball.id = registry.alloc_id();
            return ball;
        }
        if self.created < self.capacity {
            self.created += 1;
            return Ball::new(registry.alloc_id());
        }
        if let Some(oldest) = registry.oldest_ball() {
            log::warn!(
                "ball pool at capacity ({}); forcibly recycling oldest ball {:?}",
                self.capacity,
                oldest
            );
            // Unwrap-free: oldest_ball just reported it live.
            if let Some(mut ball) = registry.remove_ball(oldest) {
                ball.reset();
                ball.id = registry.alloc_id();
                return ball;
            }
        }
        // Capacity exhausted with nothing live to recycle (everything parked
        // was taken by held balls). Construct rather than fail.
        log::warn!("ball pool exceeded capacity ({}) with no recyclable ball", self.capacity);
        self.created += 1;
        Ball::new(registry.alloc_id())
    }

    /// Park a finished instance, wiping every mutable field first.
    pub fn release(&mut self, mut ball: Ball) {
        ball.reset();
        self.free.push(ball);
    }
}
