//! Effects-engine strip backend.
//!
//! Unlike the other two backends this one never touches the hardware from
//! the control task.  `render()` only *publishes* the resolved
//! (colour, effect, speed, brightness) tuple; a continuously-running
//! service thread (pinned to the app core, ~5 ms period) reads the last
//! published tuple and steps the animation onto the strip.
//!
//! ## Shared-state contract
//!
//! The tuple is packed into a single `AtomicU64` snapshot, so the service
//! thread can never observe a torn combination (new colour with a stale
//! mode) during a transition.  Both sides are lock-free: the control task
//! never blocks the renderer and the renderer never blocks the control
//! task.
//!
//! Snapshot layout (low bit first):
//!
//! ```text
//! | 0..8 brightness | 8..24 speed_ms | 24..32 effect | 32..56 colour |
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use smart_leds::RGB8;

use crate::app::ports::{EffectMode, Frame, RenderBackend};
use crate::drivers::task_pin::{self, Core};
use crate::led::palette::Rgb;
use crate::pins;

#[cfg(target_os = "espidf")]
use log::warn;
#[cfg(target_os = "espidf")]
use smart_leds::SmartLedsWrite;
#[cfg(target_os = "espidf")]
use ws2812_esp32_rmt_driver::Ws2812Esp32Rmt;

// ═══════════════════════════════════════════════════════════════
//  Shared parameter snapshot
// ═══════════════════════════════════════════════════════════════

/// The animation parameters published by the control task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FxParams {
    pub colour: Rgb,
    pub effect: EffectMode,
    pub speed_ms: u16,
    pub brightness: u8,
}

impl FxParams {
    fn pack(self) -> u64 {
        (u64::from(self.colour.to_u32()) << 32)
            | (u64::from(self.effect as u8) << 24)
            | (u64::from(self.speed_ms) << 8)
            | u64::from(self.brightness)
    }

    fn unpack(raw: u64) -> Self {
        Self {
            colour: Rgb::from_u32((raw >> 32) as u32),
            effect: EffectMode::from_u8((raw >> 24) as u8),
            speed_ms: (raw >> 8) as u16,
            brightness: raw as u8,
        }
    }
}

/// Single atomically-swapped snapshot shared between the control task
/// (writer) and the effects service thread (reader).
pub struct FxShared {
    packed: AtomicU64,
}

impl FxShared {
    pub fn new() -> Self {
        Self {
            packed: AtomicU64::new(FxParams::default().pack()),
        }
    }

    pub fn publish(&self, params: FxParams) {
        self.packed.store(params.pack(), Ordering::Release);
    }

    pub fn snapshot(&self) -> FxParams {
        FxParams::unpack(self.packed.load(Ordering::Acquire))
    }
}

// ═══════════════════════════════════════════════════════════════
//  Control-task side
// ═══════════════════════════════════════════════════════════════

pub struct FxStripBackend {
    shared: Arc<FxShared>,
}

impl FxStripBackend {
    pub fn new(shared: Arc<FxShared>) -> Self {
        Self { shared }
    }
}

impl RenderBackend for FxStripBackend {
    fn render(&mut self, frame: &Frame) {
        // A frame carrying a network indication hands the strip to the
        // indicator colour; the effect mode already encodes the cadence.
        self.shared.publish(FxParams {
            colour: frame.network.unwrap_or(frame.status),
            effect: frame.effect,
            speed_ms: frame.speed_ms.max(1),
            brightness: frame.brightness,
        });
    }
}

// ═══════════════════════════════════════════════════════════════
//  Service-thread side
// ═══════════════════════════════════════════════════════════════

/// Paint one animation frame into `buf` for the given phase.
/// Pure — the service thread and the host tests share it.
pub fn paint(params: FxParams, phase_ms: u32, buf: &mut [RGB8; pins::STRIP_LENGTH]) {
    let colour = params.colour.scaled(params.brightness);
    let period = u32::from(params.speed_ms.max(1));
    let pos = phase_ms % period;

    match params.effect {
        EffectMode::Static => {
            buf.fill(RGB8::new(colour.r, colour.g, colour.b));
        }
        EffectMode::Blink => {
            let on = pos < period / 2;
            let c = if on { colour } else { Rgb::BLACK };
            buf.fill(RGB8::new(c.r, c.g, c.b));
        }
        EffectMode::Fade => {
            // Triangular ramp 0→255→0 over one period.
            let half = (period / 2).max(1);
            let level = if pos < half {
                (u64::from(pos) * 255 / u64::from(half)) as u8
            } else {
                (u64::from(period - pos) * 255 / u64::from(half)) as u8
            };
            let c = colour.scaled(level);
            buf.fill(RGB8::new(c.r, c.g, c.b));
        }
        EffectMode::ColorWipe => {
            // Fill pixel-by-pixel across the period, then restart.
            let lit = (u64::from(pos) * pins::STRIP_LENGTH as u64 / u64::from(period)) as usize + 1;
            for (i, px) in buf.iter_mut().enumerate() {
                *px = if i < lit {
                    RGB8::new(colour.r, colour.g, colour.b)
                } else {
                    RGB8::default()
                };
            }
        }
    }
}

/// Spawn the effects service thread.
///
/// Runs for the lifetime of the firmware: reads the snapshot, advances
/// the animation phase, and flushes the strip every `interval_ms`.
pub fn spawn_fx_service(
    shared: Arc<FxShared>,
    interval_ms: u32,
) -> std::thread::JoinHandle<()> {
    task_pin::spawn_on_core(Core::App, 2, 4, "ledfx\0", move || {
        service_loop(&shared, interval_ms);
    })
}

fn service_loop(shared: &FxShared, interval_ms: u32) -> ! {
    #[cfg(target_os = "espidf")]
    let mut driver = {
        // SAFETY: RMT channel 1 and the strip GPIO are owned exclusively
        // by this thread (channel 0 stays free for the plain strip
        // backend).  The stolen pin type must match pins::STRIP_GPIO.
        let channel = unsafe { esp_idf_hal::rmt::CHANNEL1::new() };
        let pin = unsafe { esp_idf_hal::gpio::Gpio4::new() };
        match Ws2812Esp32Rmt::new(channel, pin) {
            Ok(d) => Some(d),
            Err(e) => {
                warn!("fx strip init failed ({e:?}), rendering disabled");
                None
            }
        }
    };

    let mut buf = [RGB8::default(); pins::STRIP_LENGTH];
    let mut phase_ms: u32 = 0;

    loop {
        let params = shared.snapshot();
        paint(params, phase_ms, &mut buf);

        #[cfg(target_os = "espidf")]
        if let Some(driver) = driver.as_mut() {
            // Gamma is the strip driver's job here; a dropped frame is
            // repainted on the next tick anyway.
            if let Err(e) = driver.write(smart_leds::gamma(buf.iter().copied())) {
                warn!("fx strip write failed: {e:?}");
            }
        }

        phase_ms = phase_ms.wrapping_add(interval_ms);
        std::thread::sleep(std::time::Duration::from_millis(u64::from(interval_ms)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(effect: EffectMode, speed_ms: u16) -> FxParams {
        FxParams {
            colour: Rgb::new(200, 100, 50),
            effect,
            speed_ms,
            brightness: 255,
        }
    }

    #[test]
    fn snapshot_roundtrip_preserves_all_fields() {
        let p = FxParams {
            colour: Rgb::new(0x48, 0xD1, 0xCC),
            effect: EffectMode::ColorWipe,
            speed_ms: 1500,
            brightness: 128,
        };
        assert_eq!(FxParams::unpack(p.pack()), p);
    }

    #[test]
    fn publish_then_snapshot_is_exact() {
        let shared = FxShared::new();
        let p = params(EffectMode::Fade, 2000);
        shared.publish(p);
        assert_eq!(shared.snapshot(), p);
    }

    #[test]
    fn static_paints_every_pixel() {
        let mut buf = [RGB8::default(); pins::STRIP_LENGTH];
        paint(params(EffectMode::Static, 1000), 123, &mut buf);
        assert!(buf.iter().all(|&p| p == RGB8::new(200, 100, 50)));
    }

    #[test]
    fn blink_alternates_between_halves() {
        let mut buf = [RGB8::default(); pins::STRIP_LENGTH];
        paint(params(EffectMode::Blink, 1000), 100, &mut buf);
        assert_eq!(buf[0], RGB8::new(200, 100, 50));
        paint(params(EffectMode::Blink, 1000), 600, &mut buf);
        assert_eq!(buf[0], RGB8::new(0, 0, 0));
    }

    #[test]
    fn wipe_progresses_across_the_strip() {
        let mut buf = [RGB8::default(); pins::STRIP_LENGTH];
        paint(params(EffectMode::ColorWipe, 800), 0, &mut buf);
        let lit_start = buf.iter().filter(|&&p| p != RGB8::default()).count();
        paint(params(EffectMode::ColorWipe, 800), 700, &mut buf);
        let lit_late = buf.iter().filter(|&&p| p != RGB8::default()).count();
        assert!(lit_start < lit_late);
        assert_eq!(lit_late, pins::STRIP_LENGTH);
    }

    #[test]
    fn fade_is_dark_at_phase_zero_and_bright_mid_period() {
        let mut buf = [RGB8::default(); pins::STRIP_LENGTH];
        paint(params(EffectMode::Fade, 1000), 0, &mut buf);
        let dark = buf[0];
        paint(params(EffectMode::Fade, 1000), 500, &mut buf);
        let bright = buf[0];
        assert!(dark.r < bright.r);
        assert_eq!(bright, RGB8::new(200, 100, 50));
    }

    #[test]
    fn brightness_zero_blanks_the_output() {
        let mut buf = [RGB8::default(); pins::STRIP_LENGTH];
        let p = FxParams {
            brightness: 0,
            ..params(EffectMode::Static, 1000)
        };
        paint(p, 0, &mut buf);
        assert!(buf.iter().all(|&px| px == RGB8::default()));
    }
}
