//! Scheduler-backed quiz driver
//!
//! Pairs a `QuizSession` with a `Scheduler`. Every screen the session
//! produces is pushed to an unbounded channel; when that screen is an
//! interlude, the driver cancels whatever timer is pending and schedules
//! exactly one resumption carrying the interlude's ticket.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::core::bank::QuizMode;
use crate::core::scheduler::{CancelHandle, Scheduler};
use crate::core::session::QuizSession;
use crate::types::{InterludeTicket, QuizError, Screen};

/// Item on the driver channel: a screen, or a failure while resuming
pub type ScreenUpdate = Result<Screen, QuizError>;

struct Shared {
    session: Mutex<QuizSession>,
    scheduler: Arc<dyn Scheduler>,
    timer: Mutex<Option<CancelHandle>>,
    screens: mpsc::UnboundedSender<ScreenUpdate>,
    interlude_delay: Duration,
}

impl Shared {
    fn session(&self) -> MutexGuard<'_, QuizSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel_timer(&self) {
        if let Some(handle) = self.timer.lock().unwrap_or_else(PoisonError::into_inner).take() {
            handle.cancel();
        }
    }
}

/// Drives one quiz session with timed interludes
#[derive(Clone)]
pub struct QuizDriver {
    shared: Arc<Shared>,
}

impl QuizDriver {
    /// Wrap a session; its current screen is sent right away
    pub fn new(
        session: QuizSession,
        scheduler: Arc<dyn Scheduler>,
        interlude_delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<ScreenUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let first = session.current_screen().cloned();
        let shared = Arc::new(Shared {
            session: Mutex::new(session),
            scheduler,
            timer: Mutex::new(None),
            screens: tx,
            interlude_delay,
        });
        if let Some(screen) = first {
            publish(&shared, screen);
        }
        (Self { shared }, rx)
    }

    pub fn submit_likert(&self, response: f64, response_time_secs: f64) -> Result<(), QuizError> {
        let screen = self.shared.session().submit_likert(response, response_time_secs)?;
        publish(&self.shared, screen);
        Ok(())
    }

    pub fn submit_forced_choice(&self, option_key: &str, response_time_secs: f64) -> Result<(), QuizError> {
        let screen = self
            .shared
            .session()
            .submit_forced_choice(option_key, response_time_secs)?;
        publish(&self.shared, screen);
        Ok(())
    }

    /// Start over; a pending interlude timer is cancelled first
    pub fn reset(&self, mode: QuizMode) -> Result<(), QuizError> {
        self.shared.cancel_timer();
        let screen = self.shared.session().reset(mode)?;
        publish(&self.shared, screen);
        Ok(())
    }

    /// Read the session under the lock
    pub fn with_session<R>(&self, f: impl FnOnce(&QuizSession) -> R) -> R {
        f(&self.shared.session())
    }
}

fn publish(shared: &Arc<Shared>, screen: Screen) {
    if let Screen::Interlude { ticket, .. } = &screen {
        schedule_resume(shared, *ticket);
    }
    if shared.screens.send(Ok(screen)).is_err() {
        debug!("screen receiver dropped");
    }
}

fn schedule_resume(shared: &Arc<Shared>, ticket: InterludeTicket) {
    let mut timer = shared.timer.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(previous) = timer.take() {
        previous.cancel();
    }

    let weak: Weak<Shared> = Arc::downgrade(shared);
    let handle = shared.scheduler.schedule_once(
        shared.interlude_delay,
        Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                resume(&shared, ticket);
            }
        }),
    );
    debug!(
        generation = ticket.generation,
        serial = ticket.serial,
        delay_ms = shared.interlude_delay.as_millis() as u64,
        "interlude resumption scheduled"
    );
    *timer = Some(handle);
}

fn resume(shared: &Arc<Shared>, ticket: InterludeTicket) {
    let outcome = shared.session().resume_interlude(ticket);
    match outcome {
        Ok(Some(screen)) => publish(shared, screen),
        Ok(None) => {}
        Err(err) => {
            error!(code = err.code(), error = %err, "interlude resumption failed");
            if shared.screens.send(Err(err)).is_err() {
                debug!("screen receiver dropped");
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
