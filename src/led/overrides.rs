//! Temporary colour-override store.
//!
//! The web UI and MQTT boundary can pin any of 8 fixed status categories to
//! a user-chosen colour (and optionally brightness), with an optional
//! auto-expiry measured in hours.  Overrides are ephemeral by design — they
//! live in RAM only and a restart always returns the display to computed
//! behaviour.
//!
//! ## Category translation
//!
//! Resolution is keyed by *EVSE condition*, never by the colour a condition
//! happens to render as.  Two conditions may legally share a colour class
//! (and installers can re-palette classes at runtime), so deriving the
//! category from the resolved colour mis-files overrides — the
//! [`category_for`] table below is the single, total source of truth.

use log::{debug, info};

use crate::error::Error;
use crate::led::arbiter::LedState;
use crate::led::palette::{ColorClass, Rgb};

// ═══════════════════════════════════════════════════════════════
//  Categories
// ═══════════════════════════════════════════════════════════════

/// Number of override slots — one per category, fixed.
pub const CATEGORY_COUNT: usize = 8;

/// The 8 fixed override categories addressable from the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OverrideCategory {
    Off = 0,
    Error = 1,
    Ready = 2,
    Waiting = 3,
    Charging = 4,
    Custom = 5,
    Default = 6,
    /// Wildcard: when active, wins over any category-specific slot
    /// for every display state.
    All = 7,
}

impl OverrideCategory {
    pub const ALL_CATEGORIES: [OverrideCategory; CATEGORY_COUNT] = [
        Self::Off,
        Self::Error,
        Self::Ready,
        Self::Waiting,
        Self::Charging,
        Self::Custom,
        Self::Default,
        Self::All,
    ];

    /// Parse a request-boundary category name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "off" => Some(Self::Off),
            "error" => Some(Self::Error),
            "ready" => Some(Self::Ready),
            "waiting" => Some(Self::Waiting),
            "charging" => Some(Self::Charging),
            "custom" => Some(Self::Custom),
            "default" => Some(Self::Default),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Ready => "ready",
            Self::Waiting => "waiting",
            Self::Charging => "charging",
            Self::Custom => "custom",
            Self::Default => "default",
            Self::All => "all",
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  EVSE condition → category translation
// ═══════════════════════════════════════════════════════════════

/// What the EVSE controller is actually doing, independent of the colour
/// it asked the display to show for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvseCondition {
    Ready,
    Waiting,
    Charging,
    Error,
    Custom,
    Default,
}

/// Classify the controller's signals into a condition.
///
/// The boolean flags take precedence over the colour class: `charging`
/// must be recognised even though its display colour (teal) differs from
/// the category name, and a fault is a fault regardless of palette.
pub fn classify_evse(fault: bool, charging: bool, class: ColorClass) -> EvseCondition {
    if fault {
        return EvseCondition::Error;
    }
    if charging {
        return EvseCondition::Charging;
    }
    match class {
        ColorClass::Green => EvseCondition::Ready,
        ColorClass::Yellow => EvseCondition::Waiting,
        ColorClass::Violet => EvseCondition::Custom,
        _ => EvseCondition::Default,
    }
}

/// The total condition → category table.
pub fn category_for(condition: EvseCondition) -> OverrideCategory {
    match condition {
        EvseCondition::Ready => OverrideCategory::Ready,
        EvseCondition::Waiting => OverrideCategory::Waiting,
        EvseCondition::Charging => OverrideCategory::Charging,
        EvseCondition::Error => OverrideCategory::Error,
        EvseCondition::Custom => OverrideCategory::Custom,
        EvseCondition::Default => OverrideCategory::Default,
    }
}

/// Category a display state resolves against.
///
/// `None` for the self-test states — they are diagnostic and bypass the
/// override machinery entirely.  The network states show the EVSE status
/// colour underneath their flash pattern, so they translate exactly like
/// `EvseStatus`.
pub fn category_for_state(state: LedState, condition: EvseCondition) -> Option<OverrideCategory> {
    match state {
        LedState::Off => Some(OverrideCategory::Off),
        LedState::SelfTest(_) => None,
        LedState::EvseStatus
        | LedState::ApWaiting
        | LedState::ApConnected
        | LedState::ClientConnecting
        | LedState::ClientConnected => Some(category_for(condition)),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Records and store
// ═══════════════════════════════════════════════════════════════

/// One override slot.  Replaced wholesale by `set`, reset by clear/expiry.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideRecord {
    active: bool,
    colour: Rgb,
    /// `None` = read the process-wide brightness at resolution time.
    brightness: Option<u8>,
    /// Monotonic timestamp of the `set` call.
    set_at_ms: u64,
    /// `None` = never auto-expire; only an explicit clear removes it.
    timeout_ms: Option<u64>,
}

impl OverrideRecord {
    fn expired(&self, now_ms: u64) -> bool {
        match (self.active, self.timeout_ms) {
            (true, Some(timeout)) => now_ms.saturating_sub(self.set_at_ms) >= timeout,
            _ => false,
        }
    }

    /// Remaining time before expiry, `None` for inactive or untimed slots.
    fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        match (self.active, self.timeout_ms) {
            (true, Some(timeout)) => {
                Some(timeout.saturating_sub(now_ms.saturating_sub(self.set_at_ms)))
            }
            _ => None,
        }
    }
}

/// Fixed-size table of override records, one per category.
#[derive(Debug, Clone, Default)]
pub struct OverrideStore {
    slots: [OverrideRecord; CATEGORY_COUNT],
}

impl OverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate an override.  Replaces the slot wholesale and stamps the
    /// creation time; concurrent overrides on different categories coexist
    /// independently.  `brightness` 0 is normalised to "use global";
    /// `timeout_ms` 0 is normalised to "never expire".
    pub fn set(
        &mut self,
        category: OverrideCategory,
        colour: Rgb,
        brightness: Option<u8>,
        timeout_ms: Option<u64>,
        now_ms: u64,
    ) {
        self.slots[category as usize] = OverrideRecord {
            active: true,
            colour,
            brightness: brightness.filter(|&b| b > 0),
            set_at_ms: now_ms,
            timeout_ms: timeout_ms.filter(|&t| t > 0),
        };
        info!(
            "override '{}' set to #{:06X} (timeout {:?})",
            category.name(),
            colour.to_u32(),
            self.slots[category as usize].timeout_ms,
        );
    }

    /// Name-based `set` for the request boundary.
    pub fn set_by_name(
        &mut self,
        name: &str,
        colour: Rgb,
        brightness: Option<u8>,
        timeout_ms: Option<u64>,
        now_ms: u64,
    ) -> Result<(), Error> {
        let category = OverrideCategory::from_name(name).ok_or(Error::InvalidCategory)?;
        self.set(category, colour, brightness, timeout_ms, now_ms);
        Ok(())
    }

    /// Deactivate one slot, or all 8 when `category` is `None`.
    /// Idempotent — clearing an inactive slot is a no-op.
    pub fn clear(&mut self, category: Option<OverrideCategory>) {
        match category {
            Some(c) => self.slots[c as usize] = OverrideRecord::default(),
            None => self.slots = Default::default(),
        }
    }

    /// Name-based `clear` for the request boundary.  An unknown name is
    /// rejected, not ignored.
    pub fn clear_by_name(&mut self, name: Option<&str>) -> Result<(), Error> {
        match name {
            Some(n) => {
                let category = OverrideCategory::from_name(n).ok_or(Error::InvalidCategory)?;
                self.clear(Some(category));
            }
            None => self.clear(None),
        }
        Ok(())
    }

    /// Deactivate every active, timed slot whose deadline has passed.
    /// Returns `true` if anything expired (the display needs refreshing).
    pub fn check_timeouts(&mut self, now_ms: u64) -> bool {
        let mut any = false;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.expired(now_ms) {
                debug!(
                    "override '{}' expired",
                    OverrideCategory::ALL_CATEGORIES[i].name()
                );
                *slot = OverrideRecord::default();
                any = true;
            }
        }
        any
    }

    /// Minimum remaining duration among active, timed slots — used to size
    /// the next sleep instead of polling at a fixed rate.  `None` when no
    /// timed override is pending.
    pub fn next_timeout_deadline(&self, now_ms: u64) -> Option<u64> {
        self.slots
            .iter()
            .filter_map(|s| s.remaining_ms(now_ms))
            .min()
    }

    /// Whether the named slot is currently active.
    pub fn is_active(&self, category: OverrideCategory) -> bool {
        self.slots[category as usize].active
    }

    /// The record that governs `category` right now: the `all` wildcard if
    /// active, else the category's own slot if active, else nothing.
    fn governing(&self, category: OverrideCategory) -> Option<&OverrideRecord> {
        let all = &self.slots[OverrideCategory::All as usize];
        if all.active {
            return Some(all);
        }
        let slot = &self.slots[category as usize];
        slot.active.then_some(slot)
    }

    /// Effective colour for a category, falling back to the computed one.
    pub fn resolve_colour(&self, category: OverrideCategory, computed: Rgb) -> Rgb {
        self.governing(category).map_or(computed, |r| r.colour)
    }

    /// Effective brightness for a category.  A record without its own
    /// brightness reads the process-wide value at resolution time — it is
    /// never a frozen copy.
    pub fn resolve_brightness(&self, category: OverrideCategory, global: u8) -> u8 {
        self.governing(category)
            .and_then(|r| r.brightness)
            .unwrap_or(global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgb = Rgb::new(255, 0, 0);
    const GREEN: Rgb = Rgb::new(0, 255, 0);
    const COMPUTED: Rgb = Rgb::new(10, 20, 30);

    #[test]
    fn every_category_name_roundtrips() {
        for c in OverrideCategory::ALL_CATEGORIES {
            assert_eq!(OverrideCategory::from_name(c.name()), Some(c));
        }
        assert_eq!(OverrideCategory::from_name("bogus"), None);
        assert_eq!(OverrideCategory::from_name("Charging"), None); // case-sensitive
    }

    #[test]
    fn set_then_resolve_returns_override_for_all_categories() {
        for c in OverrideCategory::ALL_CATEGORIES {
            let mut store = OverrideStore::new();
            store.set(c, RED, Some(42), None, 0);
            assert_eq!(store.resolve_colour(c, COMPUTED), RED);
            assert_eq!(store.resolve_brightness(c, 200), 42);
        }
    }

    #[test]
    fn inactive_slot_resolves_to_computed_values() {
        let store = OverrideStore::new();
        assert_eq!(store.resolve_colour(OverrideCategory::Ready, COMPUTED), COMPUTED);
        assert_eq!(store.resolve_brightness(OverrideCategory::Ready, 180), 180);
    }

    #[test]
    fn all_wildcard_beats_specific_slot() {
        let mut store = OverrideStore::new();
        store.set(OverrideCategory::Charging, GREEN, None, None, 0);
        store.set(OverrideCategory::All, RED, Some(7), None, 0);
        assert_eq!(store.resolve_colour(OverrideCategory::Charging, COMPUTED), RED);
        assert_eq!(store.resolve_brightness(OverrideCategory::Charging, 200), 7);
        // Clearing the wildcard re-exposes the specific slot.
        store.clear(Some(OverrideCategory::All));
        assert_eq!(store.resolve_colour(OverrideCategory::Charging, COMPUTED), GREEN);
    }

    #[test]
    fn zero_timeout_never_expires() {
        let mut store = OverrideStore::new();
        store.set(OverrideCategory::Error, RED, None, Some(0), 0);
        assert!(!store.check_timeouts(u64::MAX));
        assert!(store.is_active(OverrideCategory::Error));
        assert_eq!(store.next_timeout_deadline(u64::MAX), None);
    }

    #[test]
    fn timed_override_expires_at_deadline() {
        const HOUR_MS: u64 = 3_600_000;
        let mut store = OverrideStore::new();
        store.set(OverrideCategory::Charging, RED, None, Some(HOUR_MS), 1000);

        assert!(!store.check_timeouts(1000));
        assert!(store.is_active(OverrideCategory::Charging));
        assert!(!store.check_timeouts(1000 + HOUR_MS - 1));
        assert!(store.is_active(OverrideCategory::Charging));

        assert!(store.check_timeouts(1000 + HOUR_MS));
        assert!(!store.is_active(OverrideCategory::Charging));
        // Expiry is monotonic — a later check does not resurrect it.
        assert!(!store.check_timeouts(1000 + 2 * HOUR_MS));
        assert_eq!(store.resolve_colour(OverrideCategory::Charging, COMPUTED), COMPUTED);
    }

    #[test]
    fn next_deadline_is_minimum_of_timed_slots() {
        let mut store = OverrideStore::new();
        store.set(OverrideCategory::Ready, RED, None, Some(5000), 0);
        store.set(OverrideCategory::Waiting, GREEN, None, Some(2000), 0);
        store.set(OverrideCategory::Custom, GREEN, None, None, 0); // untimed
        assert_eq!(store.next_timeout_deadline(0), Some(2000));
        assert_eq!(store.next_timeout_deadline(1500), Some(500));
    }

    #[test]
    fn clear_all_deactivates_every_slot() {
        let mut store = OverrideStore::new();
        for c in OverrideCategory::ALL_CATEGORIES {
            store.set(c, RED, None, None, 0);
        }
        store.clear(None);
        for c in OverrideCategory::ALL_CATEGORIES {
            assert!(!store.is_active(c));
        }
    }

    #[test]
    fn clear_one_leaves_others_untouched() {
        let mut store = OverrideStore::new();
        store.set(OverrideCategory::Charging, RED, None, None, 0);
        store.set(OverrideCategory::Error, GREEN, None, None, 0);
        store.clear(Some(OverrideCategory::Charging));
        assert!(!store.is_active(OverrideCategory::Charging));
        assert!(store.is_active(OverrideCategory::Error));
        // Idempotent.
        store.clear(Some(OverrideCategory::Charging));
        assert!(store.is_active(OverrideCategory::Error));
    }

    #[test]
    fn unknown_name_is_rejected_and_store_unchanged() {
        let mut store = OverrideStore::new();
        store.set(OverrideCategory::Ready, GREEN, None, None, 0);
        assert_eq!(
            store.set_by_name("bogus", RED, None, None, 0),
            Err(Error::InvalidCategory)
        );
        assert_eq!(store.clear_by_name(Some("bogus")), Err(Error::InvalidCategory));
        assert!(store.is_active(OverrideCategory::Ready));
        assert_eq!(store.resolve_colour(OverrideCategory::Ready, COMPUTED), GREEN);
    }

    #[test]
    fn brightness_zero_means_use_global() {
        let mut store = OverrideStore::new();
        store.set(OverrideCategory::Waiting, RED, Some(0), None, 0);
        assert_eq!(store.resolve_brightness(OverrideCategory::Waiting, 99), 99);
        // Global changes are reflected without a new set.
        assert_eq!(store.resolve_brightness(OverrideCategory::Waiting, 123), 123);
    }

    #[test]
    fn replacing_a_slot_restarts_its_clock() {
        let mut store = OverrideStore::new();
        store.set(OverrideCategory::Charging, RED, None, Some(1000), 0);
        // Replace just before expiry; the new record gets a fresh deadline.
        store.set(OverrideCategory::Charging, GREEN, None, Some(1000), 999);
        assert!(!store.check_timeouts(1500));
        assert!(store.is_active(OverrideCategory::Charging));
        assert!(store.check_timeouts(1999));
    }

    // ── Condition translation ─────────────────────────────────

    #[test]
    fn flags_take_precedence_over_colour_class() {
        // Charging renders teal — the category must still be `charging`.
        assert_eq!(
            classify_evse(false, true, ColorClass::Teal),
            EvseCondition::Charging
        );
        // A fault is a fault whatever colour the controller asked for.
        assert_eq!(
            classify_evse(true, false, ColorClass::Green),
            EvseCondition::Error
        );
        assert_eq!(
            classify_evse(true, true, ColorClass::Teal),
            EvseCondition::Error
        );
    }

    #[test]
    fn idle_conditions_classify_from_colour_class() {
        assert_eq!(classify_evse(false, false, ColorClass::Green), EvseCondition::Ready);
        assert_eq!(classify_evse(false, false, ColorClass::Yellow), EvseCondition::Waiting);
        assert_eq!(classify_evse(false, false, ColorClass::Violet), EvseCondition::Custom);
        assert_eq!(classify_evse(false, false, ColorClass::White), EvseCondition::Default);
        assert_eq!(classify_evse(false, false, ColorClass::Off), EvseCondition::Default);
    }

    #[test]
    fn condition_table_is_total_and_injective() {
        use EvseCondition::*;
        let mapped: Vec<_> = [Ready, Waiting, Charging, Error, Custom, Default]
            .iter()
            .map(|&c| category_for(c))
            .collect();
        let mut tags: Vec<u8> = mapped.iter().map(|&c| c as u8).collect();
        tags.sort_unstable();
        tags.dedup();
        assert_eq!(tags.len(), 6, "six conditions map to six distinct categories");
        assert!(!mapped.contains(&OverrideCategory::All));
        assert!(!mapped.contains(&OverrideCategory::Off));
    }

    #[test]
    fn self_test_states_bypass_overrides() {
        use crate::led::arbiter::TestStep;
        for step in [TestStep::Red, TestStep::Green, TestStep::Blue] {
            assert_eq!(
                category_for_state(LedState::SelfTest(step), EvseCondition::Charging),
                None
            );
        }
        assert_eq!(
            category_for_state(LedState::Off, EvseCondition::Ready),
            Some(OverrideCategory::Off)
        );
        assert_eq!(
            category_for_state(LedState::ApWaiting, EvseCondition::Charging),
            Some(OverrideCategory::Charging)
        );
    }
}
