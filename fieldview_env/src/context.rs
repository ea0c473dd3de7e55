//! Core environment context trait for FieldView hosts.

use async_trait::async_trait;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Multiplier used to spread a master seed across independent RNG streams.
const STREAM_MIX: u64 = 0x517c_c1b7_2722_0a95;

/// Combines a master seed with a stream id into a sub-seed.
///
/// Separate streams (positional noise, position randomization, scenario
/// construction) must not share a generator, otherwise adding a node to a
/// scenario would shift every later noise sample.
pub fn mix_seed(seed: u64, stream: u64) -> u64 {
    seed.wrapping_mul(STREAM_MIX) ^ stream
}

/// The central interface for environment interaction.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wall clock, OS-seeded master seed
/// - **Simulation**: `SimContext` - virtual clock, fixed master seed
///
/// # Determinism
///
/// All methods that would normally introduce non-determinism (time,
/// randomness) are controlled by the implementation.
#[async_trait]
pub trait FieldContext: Send + Sync + 'static {
    /// Returns the monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);

    /// Returns the context's master seed (for logging/replay).
    fn seed(&self) -> u64;

    /// Creates a deterministic generator for the given stream.
    ///
    /// The same `(seed, stream)` pair always yields the same sequence.
    fn derive_rng(&self, stream: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(mix_seed(self.seed(), stream))
    }
}
