//! Shared test setup: a `tracing` subscriber honouring `RUST_LOG`, plus the
//! deterministic random source the scenario tests draw keys from.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a test-writer `fmt` subscriber once per test binary.
///
/// Defaults to `warn` when `RUST_LOG` is unset; run with
/// `RUST_LOG=dense_handle_map=trace,map_fuzz=debug` to see growth and timing.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Fixed seed so any failure reproduces.
pub const SEED: [u8; 32] = *b"0123456789abcdef0123456789abcdef";

pub fn seeded_rng() -> StdRng {
    StdRng::from_seed(SEED)
}

/// 32 bytes, the size of a session public key.
pub type Key = [u8; 32];
pub type Value = [u8; 32];

pub fn random_bytes(rng: &mut impl RngCore) -> [u8; 32] {
    let mut b = [0u8; 32];
    rng.fill_bytes(&mut b);
    b
}
