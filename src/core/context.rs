/// The process-wide context: config, cache, backend, log, registry and
/// dispatcher, created once at startup and shared via `Arc` clones into
/// every HTTP handler and the discovery broadcaster -- "no singletons" per
/// the teacher's design intent, generalized from its per-request
/// `web::Data<T>` clones to a single bundled struct.
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::backend::SimulationBackend;
use crate::core::cache::ResultsCache;
use crate::core::config::Config;
use crate::core::dispatcher::ToolDispatcher;
use crate::core::log_buffer::LogBuffer;
use crate::core::registry::ToolRegistry;

pub struct AppContext {
    pub config: Config,
    pub cache: Arc<ResultsCache>,
    pub backend: Arc<dyn SimulationBackend>,
    pub log: Arc<LogBuffer>,
    pub registry: Arc<ToolRegistry>,
    pub dispatcher: Arc<ToolDispatcher>,
    pub start_time: DateTime<Utc>,
    pub instance_id: Uuid,
    /// Mutable only via `set_network_visible`; read by the discovery
    /// endpoint and broadcaster so a mid-session visibility change (there
    /// isn't one today, but the broadcaster reads it every interval by
    /// design) is reflected on the next announcement.
    network_visible: AtomicBool,
    /// Requests served since startup; mirrors the teacher's `AtomicU64`
    /// metrics counter.
    request_count: AtomicU64,
    /// The port the server actually bound, filled in once `PortAllocator`
    /// succeeds.
    bound_port: AtomicU64,
}

impl AppContext {
    pub fn new(
        config: Config,
        cache: Arc<ResultsCache>,
        backend: Arc<dyn SimulationBackend>,
        log: Arc<LogBuffer>,
        registry: Arc<ToolRegistry>,
        dispatcher: Arc<ToolDispatcher>,
    ) -> Self {
        let network_visible = config.network_visible;
        Self {
            config,
            cache,
            backend,
            log,
            registry,
            dispatcher,
            start_time: Utc::now(),
            instance_id: Uuid::new_v4(),
            network_visible: AtomicBool::new(network_visible),
            request_count: AtomicU64::new(0),
            bound_port: AtomicU64::new(0),
        }
    }

    pub fn network_visible(&self) -> bool {
        self.network_visible.load(Ordering::Relaxed)
    }

    pub fn set_network_visible(&self, visible: bool) {
        self.network_visible.store(visible, Ordering::Relaxed);
    }

    pub fn increment_request_count(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn set_bound_port(&self, port: u16) {
        self.bound_port.store(port as u64, Ordering::Relaxed);
    }

    pub fn bound_port(&self) -> u16 {
        self.bound_port.load(Ordering::Relaxed) as u16
    }
}
