//! Protocol dispatcher: routes inbound frames to their handlers.
//!
//! Every inbound message is handled start to finish under a single state
//! lock, so pool and ledger mutations never interleave. Outbound delivery
//! goes through per-connection unbounded queues and never blocks a
//! handler. Failures are converted into an `error` reply to the offending
//! connection; one bad message never affects other clients.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc};
use uuid::Uuid;

use crate::domain::registry::ClientHandle;
use crate::domain::{MatcherState, ProfileDirectory, RideId, RideStatus, RiderSummary};
use crate::error::MatcherError;
use crate::service::MatchService;
use crate::ws::messages::{BookingDecision, ClientMessage, MatchInfo, ServerMessage};

/// Role binding of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientIdentity {
    /// Bound as a driver with this id.
    Driver(String),
    /// Bound as a user with this id.
    User(String),
    /// Bound as the single observer.
    Observer,
}

impl ClientIdentity {
    /// Role name for error messages.
    #[must_use]
    pub const fn role_name(&self) -> &'static str {
        match self {
            Self::Driver(_) => "driver",
            Self::User(_) => "user",
            Self::Observer => "matcher",
        }
    }
}

/// Per-connection session: the opaque connection id, the outbound queue,
/// and the role binding assigned on first registration.
#[derive(Debug)]
pub struct ClientSession {
    conn_id: Uuid,
    sender: mpsc::UnboundedSender<ServerMessage>,
    identity: Option<ClientIdentity>,
}

impl ClientSession {
    /// Creates an unbound session around a connection's outbound queue.
    #[must_use]
    pub fn new(sender: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            sender,
            identity: None,
        }
    }

    /// The opaque id assigned to this connection.
    #[must_use]
    pub const fn conn_id(&self) -> Uuid {
        self.conn_id
    }

    /// The role binding, if registration has happened.
    #[must_use]
    pub const fn identity(&self) -> Option<&ClientIdentity> {
        self.identity.as_ref()
    }

    /// Queues a frame for this connection. Delivery failure is logged and
    /// swallowed; it is never fatal.
    pub fn send(&self, message: ServerMessage) {
        if self.sender.send(message).is_err() {
            tracing::warn!(conn_id = %self.conn_id, "failed to queue frame for connection");
        }
    }

    fn handle(&self) -> ClientHandle {
        ClientHandle::new(self.conn_id, self.sender.clone())
    }
}

/// Routes parsed frames to registration, status, match, and booking
/// handlers, owning the shared state lock and the reminder timers.
#[derive(Debug)]
pub struct Dispatcher {
    state: Arc<Mutex<MatcherState>>,
    directory: Arc<ProfileDirectory>,
    matcher: MatchService,
    remind_delay: Duration,
}

impl Dispatcher {
    /// Creates a dispatcher over empty state.
    #[must_use]
    pub fn new(
        directory: Arc<ProfileDirectory>,
        matcher: MatchService,
        remind_delay: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(MatcherState::new())),
            directory,
            matcher,
            remind_delay,
        }
    }

    /// Shared state handle, for composition and inspection.
    #[must_use]
    pub fn state(&self) -> &Arc<Mutex<MatcherState>> {
        &self.state
    }

    /// Handles one inbound text frame from `session`.
    ///
    /// Parse failures and handler errors become `error` replies to this
    /// connection only.
    pub async fn handle_text(&self, session: &mut ClientSession, text: &str) {
        let message = match ClientMessage::parse(text) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(conn_id = %session.conn_id, error = %err, "rejected inbound frame");
                session.send(ServerMessage::Error {
                    message: err.to_string(),
                });
                return;
            }
        };

        tracing::debug!(conn_id = %session.conn_id, ?message, "received frame");
        let mut state = self.state.lock().await;
        let result = match message {
            ClientMessage::DriverRegister { driver_id } => {
                self.register_driver(&mut state, session, driver_id)
            }
            ClientMessage::UserRegister { user_id } => {
                self.register_user(&mut state, session, user_id)
            }
            ClientMessage::MatcherRegister => self.register_matcher(&mut state, session),
            ClientMessage::DriverStatus {
                is_available,
                location,
            } => self.driver_status(&mut state, session, is_available, location),
            ClientMessage::MatchRequest { user_id, driver_id } => {
                self.match_request(&mut state, session, &user_id, &driver_id)
            }
            ClientMessage::BookingResponse { ride_id, response } => {
                self.booking_response(&mut state, session, ride_id, response)
            }
        };

        if let Err(err) = result {
            tracing::warn!(conn_id = %session.conn_id, error = %err, "frame handling failed");
            session.send(ServerMessage::Error {
                message: err.to_string(),
            });
        }
    }

    /// Cleanup on transport close: drops the registry binding, removes the
    /// pool entry if this was the active binding for a driver or user, and
    /// pushes a fresh snapshot to any surviving observer.
    pub async fn handle_disconnect(&self, session: &ClientSession) {
        let mut state = self.state.lock().await;
        state.registry.unregister(session.conn_id);

        match &session.identity {
            // A superseded connection must not evict its replacement's
            // pool entry, so membership follows the registry.
            Some(ClientIdentity::Driver(id)) => {
                if !state.registry.is_driver_connected(id) {
                    state.pool.remove_driver(id);
                }
            }
            Some(ClientIdentity::User(id)) => {
                if !state.registry.is_user_connected(id) {
                    state.pool.remove_user(id);
                }
            }
            Some(ClientIdentity::Observer) | None => {}
        }

        tracing::info!(
            conn_id = %session.conn_id,
            identity = ?session.identity,
            "connection closed"
        );
        state.push_pool_to_observer(None);
    }

    fn bind_identity(
        session: &mut ClientSession,
        wanted: ClientIdentity,
    ) -> Result<(), MatcherError> {
        match &session.identity {
            Some(existing) if *existing == wanted => Ok(()),
            Some(existing) => Err(MatcherError::AlreadyRegistered(existing.role_name())),
            None => {
                session.identity = Some(wanted);
                Ok(())
            }
        }
    }

    fn register_driver(
        &self,
        state: &mut MatcherState,
        session: &mut ClientSession,
        driver_id: String,
    ) -> Result<(), MatcherError> {
        let template = self
            .directory
            .driver(&driver_id)
            .ok_or_else(|| MatcherError::UnknownDriver(driver_id.clone()))?
            .clone();
        Self::bind_identity(session, ClientIdentity::Driver(driver_id.clone()))?;

        state.registry.register_driver(&driver_id, session.handle());
        if state.pool.add_driver(template) {
            tracing::info!(%driver_id, "driver joined active pool");
        }

        session.send(ServerMessage::RegistrationSuccess {
            message: "Driver registered successfully".to_string(),
            pool: state.registry.counts(),
        });
        state.push_pool_to_observer(None);
        Ok(())
    }

    fn register_user(
        &self,
        state: &mut MatcherState,
        session: &mut ClientSession,
        user_id: String,
    ) -> Result<(), MatcherError> {
        let template = self
            .directory
            .user(&user_id)
            .ok_or_else(|| MatcherError::UnknownUser(user_id.clone()))?
            .clone();
        Self::bind_identity(session, ClientIdentity::User(user_id.clone()))?;

        state.registry.register_user(&user_id, session.handle());
        if state.pool.add_user(template) {
            tracing::info!(%user_id, "user joined active pool");
        }

        session.send(ServerMessage::RegistrationSuccess {
            message: "User registered successfully".to_string(),
            pool: state.registry.counts(),
        });
        state.push_pool_to_observer(None);
        Ok(())
    }

    fn register_matcher(
        &self,
        state: &mut MatcherState,
        session: &mut ClientSession,
    ) -> Result<(), MatcherError> {
        Self::bind_identity(session, ClientIdentity::Observer)?;
        state.registry.register_observer(session.handle());
        tracing::info!(conn_id = %session.conn_id, "matcher registered");

        session.send(state.pool_update(None));
        Ok(())
    }

    fn driver_status(
        &self,
        state: &mut MatcherState,
        session: &mut ClientSession,
        is_available: bool,
        location: Option<crate::domain::GeoPoint>,
    ) -> Result<(), MatcherError> {
        let Some(ClientIdentity::Driver(driver_id)) = session.identity.clone() else {
            return Err(MatcherError::RoleMismatch(
                "only registered drivers can update status",
            ));
        };

        let applied = state.pool.set_driver_availability(
            &driver_id,
            is_available,
            location,
            || self.directory.driver(&driver_id).cloned(),
        );
        if !applied {
            return Err(MatcherError::UnknownDriver(driver_id));
        }

        let status = if is_available { "available" } else { "unavailable" };
        tracing::info!(%driver_id, status, "driver availability updated");

        state.push_pool_to_observer(None);
        session.send(ServerMessage::StatusUpdated {
            status: status.to_string(),
        });
        Ok(())
    }

    fn match_request(
        &self,
        state: &mut MatcherState,
        session: &mut ClientSession,
        user_id: &str,
        driver_id: &str,
    ) -> Result<(), MatcherError> {
        if session.identity != Some(ClientIdentity::Observer) {
            return Err(MatcherError::RoleMismatch(
                "only the matcher can request matches",
            ));
        }

        match self.matcher.propose(state, user_id, driver_id) {
            Ok(ride_id) => session.send(ServerMessage::MatchResult {
                success: true,
                message: "Match request sent".to_string(),
                ride_id: Some(ride_id),
            }),
            Err(err) => {
                tracing::info!(user_id, driver_id, error = %err, "match request failed");
                session.send(ServerMessage::MatchResult {
                    success: false,
                    message: err.to_string(),
                    ride_id: None,
                });
            }
        }
        Ok(())
    }

    fn booking_response(
        &self,
        state: &mut MatcherState,
        session: &mut ClientSession,
        ride_id: RideId,
        response: BookingDecision,
    ) -> Result<(), MatcherError> {
        let ride = state
            .ledger
            .get(ride_id)
            .ok_or(MatcherError::RideNotFound(ride_id))?
            .clone();

        // Duplicate or late responses to a settled ride replay the ack
        // without re-running side effects.
        if ride.status.is_terminal() {
            tracing::debug!(%ride_id, status = ride.status.as_str(), "replayed booking response");
            session.send(ServerMessage::BookingProcessed {
                ride_id,
                status: ride.status,
            });
            return Ok(());
        }

        let user_id = ride.user.id.clone();
        let driver_id = ride.driver.id.clone();

        let status = match response {
            BookingDecision::Accept => {
                state.ledger.transition(ride_id, RideStatus::Accepted)?;
                state.pool.remove_user(&user_id);
                state.pool.remove_driver(&driver_id);

                if !state.registry.is_driver_connected(&driver_id) {
                    // The driver side is unrecoverable; put the user back
                    // so they stay matchable.
                    state.pool.add_user(ride.user.clone());
                    return Err(MatcherError::DriverUnreachable(driver_id));
                }

                let delivered = state.registry.send_to_client(
                    &driver_id,
                    ServerMessage::RideAccepted {
                        ride_id,
                        user: RiderSummary::from(&ride.user),
                        pickup: ride.pickup_location.clone(),
                        destination: ride.drop_location.clone(),
                        estimated_fare: ride.estimated_fare,
                        timestamp: Utc::now(),
                    },
                );
                if !delivered {
                    tracing::warn!(%ride_id, %driver_id, "ride acceptance not delivered");
                }

                tracing::info!(%ride_id, %user_id, %driver_id, "booking accepted");
                state.push_pool_to_observer(Some(MatchInfo {
                    ride_id,
                    status: RideStatus::Accepted,
                    user: user_id,
                    driver: driver_id,
                }));
                RideStatus::Accepted
            }
            BookingDecision::Reject => {
                state.ledger.transition(ride_id, RideStatus::Rejected)?;

                if state.registry.is_driver_connected(&driver_id)
                    && state.pool.add_driver(ride.driver.clone())
                {
                    tracing::info!(%driver_id, "driver returned to active pool after rejection");
                }

                let delivered = state.registry.send_to_observer(ServerMessage::MatchRejected {
                    ride_id,
                    user_id,
                    driver_id,
                    active_pool: state.pool.snapshot(),
                });
                if !delivered {
                    tracing::debug!(%ride_id, "no observer to notify of rejection");
                }
                RideStatus::Rejected
            }
            BookingDecision::Remind => {
                state.ledger.transition(ride_id, RideStatus::Remind)?;
                self.schedule_reminder(ride_id);
                RideStatus::Remind
            }
        };

        session.send(ServerMessage::BookingProcessed { ride_id, status });
        Ok(())
    }

    /// Schedules the one-shot booking reminder.
    ///
    /// The timer runs outside the message loop, so the ride may settle
    /// before it fires; the status and the user connection are re-checked
    /// under the lock at fire time.
    fn schedule_reminder(&self, ride_id: RideId) {
        let state = Arc::clone(&self.state);
        let delay = self.remind_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let state = state.lock().await;
            let Some(ride) = state.ledger.get(ride_id) else {
                return;
            };
            if ride.status != RideStatus::Remind {
                tracing::debug!(%ride_id, status = ride.status.as_str(), "reminder dropped");
                return;
            }
            if !state.registry.is_user_connected(&ride.user.id) {
                tracing::debug!(%ride_id, user_id = %ride.user.id, "reminder dropped: user gone");
                return;
            }
            state.registry.send_to_client(
                &ride.user.id,
                ServerMessage::BookingReminder {
                    ride_id,
                    driver_id: ride.driver.id.clone(),
                    driver_name: ride.driver.name.clone(),
                    pickup_time: ride.scheduled_time.clone(),
                },
            );
            tracing::info!(%ride_id, user_id = %ride.user.id, "booking reminder sent");
        });
    }
}
