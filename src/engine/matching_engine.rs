// ============================================================================
// Matching Engine
// Connection harness: one detached worker thread per client session
// ============================================================================

use crate::domain::{BookSnapshot, EngineConfig, SessionId};
use crate::engine::{BookRegistry, CommandDispatcher};
use crate::error::{EngineError, EngineResult};
use crate::interfaces::{Clock, Connection, EventHandler};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Shared venue state plus the machinery to serve connections
pub struct MatchingEngine {
    registry: Arc<BookRegistry>,
    config: EngineConfig,
    next_session: AtomicU64,
    active: Arc<AtomicUsize>,
}

/// Handle to a running session.
///
/// Dropping it detaches the worker; joining waits for the connection to
/// close and yields the number of commands processed.
#[derive(Debug)]
pub struct SessionHandle {
    session: SessionId,
    thread: JoinHandle<u64>,
}

impl SessionHandle {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn join(self) -> thread::Result<u64> {
        self.thread.join()
    }
}

/// Releases a connection slot when the worker exits, panics included
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl MatchingEngine {
    pub fn new(
        config: EngineConfig,
        clock: Arc<dyn Clock>,
        event_handler: Arc<dyn EventHandler>,
    ) -> Self {
        let registry =
            BookRegistry::with_book_capacity(clock, event_handler, config.book_capacity);

        Self {
            registry: Arc::new(registry),
            config,
            next_session: AtomicU64::new(1),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Serve `connection` on a new worker thread.
    ///
    /// Fails without touching the connection's stream when the configured
    /// session cap is reached or the thread cannot be spawned.
    pub fn accept<C>(&self, connection: C) -> EngineResult<SessionHandle>
    where
        C: Connection + Send + 'static,
    {
        let guard = self.reserve_slot()?;
        let session = self.allocate_session();
        let dispatcher = CommandDispatcher::new(Arc::clone(&self.registry), session);
        let name = format!("{}-{}", self.config.thread_name_prefix, session.0);

        let spawned = thread::Builder::new().name(name).spawn(move || {
            let _guard = guard;
            let mut connection = connection;
            tracing::debug!(session = %session, "session started");
            dispatcher.run(&mut connection)
        });

        match spawned {
            Ok(thread) => Ok(SessionHandle { session, thread }),
            Err(e) => {
                tracing::error!(session = %session, error = %e, "failed to spawn connection thread");
                Err(EngineError::Spawn(e))
            },
        }
    }

    /// Dispatcher bound to a fresh session, for callers that drive a
    /// connection on their own thread
    pub fn dispatcher(&self) -> CommandDispatcher {
        CommandDispatcher::new(Arc::clone(&self.registry), self.allocate_session())
    }

    pub fn registry(&self) -> &Arc<BookRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Sessions currently being served by worker threads
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    /// Depth snapshot of one instrument, if its book exists
    pub fn snapshot(&self, instrument: &str) -> Option<BookSnapshot> {
        self.registry.book(instrument).map(|book| book.snapshot())
    }

    fn allocate_session(&self) -> SessionId {
        SessionId(self.next_session.fetch_add(1, Ordering::Relaxed))
    }

    fn reserve_slot(&self) -> EngineResult<ActiveGuard> {
        match self.config.max_connections {
            None => {
                self.active.fetch_add(1, Ordering::AcqRel);
            },
            Some(limit) => {
                let reserved = self
                    .active
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |open| {
                        (open < limit).then_some(open + 1)
                    });
                if reserved.is_err() {
                    tracing::warn!(limit, "connection limit reached");
                    return Err(EngineError::ConnectionLimit { limit });
                }
            },
        }
        Ok(ActiveGuard(Arc::clone(&self.active)))
    }
}
