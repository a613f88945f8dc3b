//! Time-boxed, cancellable emergency escalation.
//!
//! State machine: `Idle -> Counting -> {Executing, Cancelled}`; `Executing`
//! returns to `Idle` when the protocol completes and `Cancelled` collapses to
//! `Idle` immediately. The tick transition is a pure function on
//! `EscalationState`, independent of the timer driving it, so the countdown
//! is unit-testable without wall-clock waits. At most one Counting/Executing
//! sequence is live per session; a second arm while non-Idle is rejected,
//! never queued.

use crate::collaborators::LocationProvider;
use crate::error::{VoyceError, VoyceResult};
use crate::lexicon::{LexiconStore, UNIVERSAL_EMERGENCY_NUMBER};
use crate::shared::{ConversationLog, GeoLocation, Sender};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscalationStatus {
    Idle,
    Counting,
    Executing,
    /// Transient: collapses to `Idle` within the cancel transition.
    Cancelled,
}

/// Live escalation state. Exactly one instance per session, owned by the
/// controller; mutated once per tick.
#[derive(Debug, Clone)]
pub struct EscalationState {
    pub status: EscalationStatus,
    pub remaining_secs: u32,
    /// Location snapshot taken when the escalation was armed.
    pub location: Option<GeoLocation>,
}

/// Result of applying one tick to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still counting; emit a countdown message with the remaining seconds.
    CountingDown(u32),
    /// Countdown reached zero; the protocol must run now.
    Fire,
    /// Not counting (cancelled or already firing); the timer should stop.
    Ignored,
}

impl EscalationState {
    pub fn idle() -> Self {
        Self {
            status: EscalationStatus::Idle,
            remaining_secs: 0,
            location: None,
        }
    }

    /// Pure one-second tick transition. Decrements the countdown; at zero the
    /// status moves to `Executing`.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != EscalationStatus::Counting {
            return TickOutcome::Ignored;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            TickOutcome::CountingDown(self.remaining_secs)
        } else {
            self.status = EscalationStatus::Executing;
            TickOutcome::Fire
        }
    }
}

/// Timing knobs for the controller. Defaults match the production protocol;
/// tests compress them to avoid real waits.
#[derive(Debug, Clone)]
pub struct EscalationConfig {
    /// Cancellation window before the protocol runs.
    pub countdown_secs: u32,
    /// Countdown tick period.
    pub tick_period: Duration,
    /// Delay before the reassurance follow-up messages.
    pub followup_delay: Duration,
    /// How often the tracking subscription reports position.
    pub tracking_interval: Duration,
    /// Hard cap on the tracking subscription lifetime.
    pub tracking_cap: Duration,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 30,
            tick_period: Duration::from_secs(1),
            followup_delay: Duration::from_secs(2),
            tracking_interval: Duration::from_secs(60),
            tracking_cap: Duration::from_secs(2 * 60 * 60),
        }
    }
}

/// Everything the background tasks need. Deliberately does not reference the
/// controller itself so dropping the controller tears the tasks down instead
/// of leaking them through a reference cycle.
#[derive(Clone)]
struct Shared {
    config: EscalationConfig,
    state: Arc<Mutex<EscalationState>>,
    log: ConversationLog,
    lexicon: Arc<LexiconStore>,
    locations: Arc<dyn LocationProvider>,
    tracking_task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

pub struct EscalationController {
    shared: Shared,
    countdown_task: Mutex<Option<JoinHandle<()>>>,
}

impl EscalationController {
    pub fn new(
        config: EscalationConfig,
        lexicon: Arc<LexiconStore>,
        log: ConversationLog,
        locations: Arc<dyn LocationProvider>,
    ) -> Self {
        Self {
            shared: Shared {
                config,
                state: Arc::new(Mutex::new(EscalationState::idle())),
                log,
                lexicon,
                locations,
                tracking_task: Arc::new(Mutex::new(None)),
            },
            countdown_task: Mutex::new(None),
        }
    }

    pub fn status(&self) -> EscalationStatus {
        self.shared.state.lock().expect("escalation state poisoned").status
    }

    pub fn state(&self) -> EscalationState {
        self.shared.state.lock().expect("escalation state poisoned").clone()
    }

    /// Arms the countdown. Allowed only from `Idle`; returns false (and
    /// changes nothing) when an escalation is already counting or executing.
    pub fn arm(&self, location: Option<GeoLocation>) -> bool {
        {
            let mut state = self.shared.state.lock().expect("escalation state poisoned");
            if state.status != EscalationStatus::Idle {
                warn!(status = ?state.status, "escalation already active, arm ignored");
                return false;
            }
            state.status = EscalationStatus::Counting;
            state.remaining_secs = self.shared.config.countdown_secs;
            state.location = location;
        }

        info!(countdown_secs = self.shared.config.countdown_secs, "emergency escalation armed");
        self.shared.log.append(
            Sender::System,
            format!(
                "⚠️ EMERGENCY ESCALATION: No response detected in {} seconds. Say \"I'm safe\" to cancel.",
                self.shared.config.countdown_secs
            ),
        );

        let shared = self.shared.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(shared.config.tick_period);
            // The first interval tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let outcome = shared
                    .state
                    .lock()
                    .expect("escalation state poisoned")
                    .tick();
                match outcome {
                    TickOutcome::CountingDown(remaining) => {
                        shared.log.append(
                            Sender::System,
                            format!(
                                "Emergency escalation in {}s - Say \"I'm safe\" to cancel",
                                remaining
                            ),
                        );
                    }
                    TickOutcome::Fire => {
                        run_protocol(shared.clone()).await;
                        break;
                    }
                    TickOutcome::Ignored => break,
                }
            }
        });
        *self.countdown_task.lock().expect("countdown slot poisoned") = Some(handle);
        true
    }

    /// Cancels a running countdown. Idempotent: from `Idle` or `Executing`
    /// this is a no-op and emits nothing. A successful cancel emits exactly
    /// one confirmation message.
    pub fn cancel(&self) -> bool {
        {
            let mut state = self.shared.state.lock().expect("escalation state poisoned");
            if state.status != EscalationStatus::Counting {
                debug!(status = ?state.status, "cancel ignored");
                return false;
            }
            // Cancelled is transient; observers only ever see Idle.
            *state = EscalationState::idle();
        }
        if let Some(handle) = self
            .countdown_task
            .lock()
            .expect("countdown slot poisoned")
            .take()
        {
            handle.abort();
        }
        info!("emergency escalation cancelled");
        self.shared.log.append(
            Sender::System,
            "✅ Emergency escalation cancelled. Glad you're safe!",
        );
        true
    }

    /// Panic variant: skips the countdown and the cancellation window
    /// entirely, runs the protocol at once, and announces the expanded
    /// panic-mode features. Rejected while an escalation is already live.
    pub async fn panic(&self, location: Option<GeoLocation>) -> bool {
        {
            let mut state = self.shared.state.lock().expect("escalation state poisoned");
            if state.status != EscalationStatus::Idle {
                warn!(status = ?state.status, "escalation already active, panic ignored");
                return false;
            }
            state.status = EscalationStatus::Executing;
            state.location = location;
        }
        self.shared.log.append(
            Sender::System,
            "🚨 PANIC MODE ACTIVATED - IMMEDIATE EMERGENCY RESPONSE",
        );
        run_protocol(self.shared.clone()).await;
        self.shared.log.append(
            Sender::System,
            "📱 Panic mode features activated: continuous recording, emergency contacts notified, location tracking active.",
        );
        true
    }

    /// Deterministic teardown: stops the countdown and any tracking
    /// subscription and resets to `Idle`. Also runs on drop.
    pub fn shutdown(&self) {
        if let Some(handle) = self
            .countdown_task
            .lock()
            .expect("countdown slot poisoned")
            .take()
        {
            handle.abort();
        }
        if let Some(handle) = self
            .shared
            .tracking_task
            .lock()
            .expect("tracking slot poisoned")
            .take()
        {
            handle.abort();
        }
        *self.shared.state.lock().expect("escalation state poisoned") = EscalationState::idle();
    }
}

impl Drop for EscalationController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs the emergency protocol and returns the state to `Idle`. Faults in a
/// protocol step are caught here: a degraded message with the universal
/// number is still emitted and the controller never gets stuck.
async fn run_protocol(shared: Shared) {
    shared
        .log
        .append(Sender::System, "🚨 EMERGENCY PROTOCOL ACTIVATED");
    let location = shared
        .state
        .lock()
        .expect("escalation state poisoned")
        .location
        .clone();

    if let Err(e) = execute_protocol_steps(&shared, location).await {
        warn!(error = %e, "emergency protocol step failed");
        shared.log.append(
            Sender::System,
            format!(
                "⚠️ Emergency protocol encountered an error, but basic emergency numbers are available: {}",
                UNIVERSAL_EMERGENCY_NUMBER
            ),
        );
    }

    *shared.state.lock().expect("escalation state poisoned") = EscalationState::idle();
    info!("emergency protocol finished, controller idle");
}

async fn execute_protocol_steps(
    shared: &Shared,
    location: Option<GeoLocation>,
) -> VoyceResult<()> {
    let country = location.as_ref().and_then(|l| l.country.as_deref());
    let numbers = shared.lexicon.emergency_numbers(country);
    let city = location
        .as_ref()
        .map(|l| l.city_label().to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    shared.log.append(
        Sender::System,
        format!("📞 Emergency services contacted. Location: {}", city),
    );
    shared
        .log
        .append(Sender::System, format!("Emergency numbers: {}", numbers.join(", ")));

    // Reassurance follow-ups, non-blocking.
    let followup = shared.clone();
    tokio::spawn(async move {
        tokio::time::sleep(followup.config.followup_delay).await;
        followup.log.append(
            Sender::System,
            "🆘 Help is on the way. Stay where you are if safe to do so.",
        );
        followup.log.append(
            Sender::System,
            "📱 Your location is being continuously tracked and shared with emergency services.",
        );
    });

    start_location_tracking(shared)?;
    Ok(())
}

/// Arms the capped location-tracking subscription. Fails when a subscription
/// from an earlier protocol run is still live.
fn start_location_tracking(shared: &Shared) -> VoyceResult<()> {
    let mut slot = shared.tracking_task.lock().expect("tracking slot poisoned");
    if slot.as_ref().map(|h| !h.is_finished()).unwrap_or(false) {
        return Err(VoyceError::Escalation(
            "location tracking subscription already active".to_string(),
        ));
    }

    let shared = shared.clone();
    let handle = tokio::spawn(async move {
        let started = tokio::time::Instant::now();
        let mut ticker = tokio::time::interval(shared.config.tracking_interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if started.elapsed() >= shared.config.tracking_cap {
                shared.log.append(
                    Sender::System,
                    format!(
                        "📍 Emergency location tracking ended after {}.",
                        format_span(shared.config.tracking_cap)
                    ),
                );
                break;
            }
            match shared.locations.current_location().await {
                Ok(position) => {
                    info!(
                        lat = position.lat,
                        lng = position.lng,
                        accuracy = position.accuracy,
                        "emergency location update"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "emergency location tracking error");
                    shared.log.append(
                        Sender::System,
                        "⚠️ Location tracking interrupted. Please share your location manually if possible.",
                    );
                }
            }
        }
    });
    *slot = Some(handle);
    Ok(())
}

fn format_span(span: Duration) -> String {
    let secs = span.as_secs();
    if secs >= 3600 && secs % 3600 == 0 {
        let hours = secs / 3600;
        if hours == 1 {
            "1 hour".to_string()
        } else {
            format!("{} hours", hours)
        }
    } else if secs >= 60 && secs % 60 == 0 {
        format!("{} minutes", secs / 60)
    } else {
        format!("{} seconds", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::LocationProvider;
    use async_trait::async_trait;

    struct FixedLocation;

    #[async_trait]
    impl LocationProvider for FixedLocation {
        async fn current_location(&self) -> VoyceResult<GeoLocation> {
            Ok(chennai())
        }
    }

    fn chennai() -> GeoLocation {
        GeoLocation {
            lat: 13.0827,
            lng: 80.2707,
            accuracy: 10.0,
            city: Some("Chennai".to_string()),
            country: Some("India".to_string()),
            region: Some("Tamil Nadu".to_string()),
        }
    }

    fn fast_config() -> EscalationConfig {
        EscalationConfig {
            countdown_secs: 5,
            tick_period: Duration::from_secs(1),
            followup_delay: Duration::from_secs(1),
            tracking_interval: Duration::from_secs(1),
            tracking_cap: Duration::from_secs(3),
        }
    }

    fn controller(config: EscalationConfig) -> (EscalationController, ConversationLog) {
        let log = ConversationLog::new();
        let controller = EscalationController::new(
            config,
            LexiconStore::shared(),
            log.clone(),
            Arc::new(FixedLocation),
        );
        (controller, log)
    }

    #[test]
    fn test_pure_tick_transition() {
        let mut state = EscalationState {
            status: EscalationStatus::Counting,
            remaining_secs: 2,
            location: None,
        };
        assert_eq!(state.tick(), TickOutcome::CountingDown(1));
        assert_eq!(state.tick(), TickOutcome::Fire);
        assert_eq!(state.status, EscalationStatus::Executing);
        assert_eq!(state.tick(), TickOutcome::Ignored);

        let mut idle = EscalationState::idle();
        assert_eq!(idle.tick(), TickOutcome::Ignored);
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_fires_protocol_and_returns_to_idle() {
        let (controller, log) = controller(fast_config());
        assert!(controller.arm(Some(chennai())));
        assert_eq!(controller.status(), EscalationStatus::Counting);
        assert_eq!(controller.state().remaining_secs, 5);

        tokio::time::sleep(Duration::from_secs(15)).await;

        assert_eq!(controller.status(), EscalationStatus::Idle);
        assert_eq!(log.count_containing("EMERGENCY PROTOCOL ACTIVATED"), 1);
        assert_eq!(
            log.count_containing("📞 Emergency services contacted. Location: Chennai"),
            1
        );
        assert_eq!(log.count_containing("108 - Medical Emergency"), 1);
        // Countdown messages for remaining 4..1.
        assert_eq!(log.count_containing("Emergency escalation in"), 4);
        assert_eq!(log.count_containing("Help is on the way"), 1);
        assert_eq!(log.count_containing("tracking ended after 3 seconds"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_arm_while_active_is_noop() {
        let (controller, log) = controller(fast_config());
        assert!(controller.arm(Some(chennai())));
        tokio::time::sleep(Duration::from_secs(2)).await;

        let before = controller.state();
        assert!(!controller.arm(None));
        let after = controller.state();
        assert_eq!(after.status, before.status);
        assert_eq!(after.remaining_secs, before.remaining_secs);
        // Only the first arm emitted the initial warning.
        assert_eq!(log.count_containing("⚠️ EMERGENCY ESCALATION"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_countdown() {
        let (controller, log) = controller(fast_config());
        assert!(controller.arm(Some(chennai())));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(controller.cancel());
        assert_eq!(controller.status(), EscalationStatus::Idle);
        assert_eq!(log.count_containing("escalation cancelled"), 1);

        // The aborted timer never fires the protocol.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(log.count_containing("EMERGENCY PROTOCOL ACTIVATED"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_is_noop_outside_counting() {
        let (controller, log) = controller(fast_config());
        assert!(!controller.cancel());
        assert_eq!(log.count_containing("escalation cancelled"), 0);

        // Run a full escalation to completion, then cancel from Idle again.
        controller.arm(Some(chennai()));
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert_eq!(controller.status(), EscalationStatus::Idle);
        assert!(!controller.cancel());
        assert_eq!(log.count_containing("escalation cancelled"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_bypasses_countdown() {
        let (controller, log) = controller(fast_config());
        assert!(controller.panic(Some(chennai())).await);

        assert_eq!(controller.status(), EscalationStatus::Idle);
        assert_eq!(log.count_containing("PANIC MODE ACTIVATED"), 1);
        assert_eq!(log.count_containing("EMERGENCY PROTOCOL ACTIVATED"), 1);
        assert_eq!(log.count_containing("Panic mode features activated"), 1);
        assert_eq!(log.count_containing("Emergency escalation in"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_protocol_degrades_while_tracking_active() {
        let mut config = fast_config();
        config.countdown_secs = 1;
        config.tracking_cap = Duration::from_secs(3600);
        let (controller, log) = controller(config);

        assert!(controller.panic(Some(chennai())).await);
        assert_eq!(controller.status(), EscalationStatus::Idle);

        // Tracking from the first protocol is still live; the second run
        // emits the degraded message and still lands back on Idle.
        assert!(controller.panic(Some(chennai())).await);
        assert_eq!(controller.status(), EscalationStatus::Idle);
        assert_eq!(
            log.count_containing("basic emergency numbers are available"),
            1
        );
    }

    #[test]
    fn test_format_span() {
        assert_eq!(format_span(Duration::from_secs(7200)), "2 hours");
        assert_eq!(format_span(Duration::from_secs(3600)), "1 hour");
        assert_eq!(format_span(Duration::from_secs(300)), "5 minutes");
        assert_eq!(format_span(Duration::from_secs(45)), "45 seconds");
    }
}
