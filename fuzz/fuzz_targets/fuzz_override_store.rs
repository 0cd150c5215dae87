//! Fuzz target: `OverrideStore` operation sequences.
//!
//! Interprets arbitrary bytes as a stream of set/clear/expire operations
//! with a monotonically advancing clock and asserts that the store never
//! panics, that resolution stays total, and that a full clear always
//! returns it to the inert state.
//!
//! cargo fuzz run fuzz_override_store

#![no_main]

use evsegw::led::overrides::{OverrideCategory, OverrideStore};
use evsegw::led::palette::Rgb;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut store = OverrideStore::new();
    let mut now: u64 = 0;

    for chunk in data.chunks(6) {
        let op = chunk[0] % 5;
        let cat = OverrideCategory::ALL_CATEGORIES[(chunk.get(1).copied().unwrap_or(0) % 8) as usize];
        match op {
            0 => {
                let colour = Rgb::new(
                    chunk.get(2).copied().unwrap_or(0),
                    chunk.get(3).copied().unwrap_or(0),
                    chunk.get(4).copied().unwrap_or(0),
                );
                let timeout = u64::from(chunk.get(5).copied().unwrap_or(0)) * 100;
                store.set(cat, colour, chunk.get(3).copied(), Some(timeout), now);
            }
            1 => store.clear(Some(cat)),
            2 => store.clear(None),
            3 => {
                store.check_timeouts(now);
            }
            _ => {
                now = now.saturating_add(u64::from(chunk.get(2).copied().unwrap_or(1)) * 50);
            }
        }

        // Resolution must stay total after every operation.
        for c in OverrideCategory::ALL_CATEGORIES {
            let _ = store.resolve_colour(c, Rgb::BLACK);
            let _ = store.resolve_brightness(c, 128);
        }
    }

    // A full clear always restores the inert state.
    store.clear(None);
    assert!(OverrideCategory::ALL_CATEGORIES
        .iter()
        .all(|&c| !store.is_active(c)));
    assert_eq!(store.next_timeout_deadline(now), None);
});
