/* src/server/core/rust/src/coordinator.rs */

//! Per-subtree fetch coordination.
//!
//! A [`FetchCoordinator`] decides, on mount and on every navigation, whether
//! the data for the target location still has to be loaded. Locations already
//! present in the loaded-locations registry (from the server render or an
//! earlier visit to the same navigation key) are settled synchronously; all
//! others get exactly one [`PendingLoad`] that the caller drives to completion.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context as TaskContext, Poll};

use parking_lot::Mutex;

use crate::context::Context;
use crate::errors::RefetchError;
use crate::location::{Location, SERVER_RENDER_LOCATION_KEY};
use crate::orchestrator::load_data_for_location;
use crate::registry::RefetchState;
use crate::routes::{BoxFuture, FetcherRoutes};
use crate::store::{GlobalState, Store};

/// Projection of global state onto the refetch slice.
pub type StateSelector = Arc<dyn Fn(&GlobalState) -> RefetchState + Send + Sync>;

pub fn default_state_selector() -> StateSelector {
  Arc::new(|state: &GlobalState| state.refetch.clone())
}

#[derive(Clone)]
pub struct CoordinatorConfig {
  pub routes: FetcherRoutes,
  pub state_selector: StateSelector,
}

impl CoordinatorConfig {
  pub fn new(routes: FetcherRoutes) -> Self {
    Self { routes, state_selector: default_state_selector() }
  }

  pub fn state_selector(
    mut self,
    selector: impl Fn(&GlobalState) -> RefetchState + Send + Sync + 'static,
  ) -> Self {
    self.state_selector = Arc::new(selector);
    self
  }
}

/// What a coordinator is rendered with: its configuration and the current location.
#[derive(Clone)]
pub struct CoordinatorProps {
  pub config: CoordinatorConfig,
  pub location: Location,
}

impl CoordinatorProps {
  pub fn new(config: CoordinatorConfig, location: Location) -> Self {
    Self { config, location }
  }

  /// Same configuration, new location.
  pub fn navigate(&self, location: Location) -> Self {
    Self { config: self.config.clone(), location }
  }
}

/// Whether moving from `prev` to `next` calls for a new evaluation: a different
/// navigation key or a different route configuration. Re-renders caused by
/// anything else are ignored.
pub fn needs_evaluation(prev: &CoordinatorProps, next: &CoordinatorProps) -> bool {
  prev.location.key != next.location.key || !prev.config.routes.same_config(&next.config.routes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Idle,
  /// Held only while the coordinator lock is taken, so [`FetchCoordinator::state`]
  /// never reports it.
  Evaluating,
  Fetching,
}

#[derive(Debug, Clone)]
pub struct CoordinatorState {
  /// Key of the last location whose load attempt settled (or was skipped).
  pub last_loaded_key: String,
  pub phase: Phase,
  // Bumped on every evaluation; a settling load only applies its update
  // if no newer evaluation started meanwhile.
  generation: u64,
}

impl Default for CoordinatorState {
  fn default() -> Self {
    Self {
      last_loaded_key: SERVER_RENDER_LOCATION_KEY.to_string(),
      phase: Phase::Idle,
      generation: 0,
    }
  }
}

/// Outcome of a mount or navigation.
#[must_use = "a `Fetching` evaluation loads nothing unless it is awaited"]
pub enum Evaluation {
  /// No new navigation; nothing was evaluated.
  Unchanged,
  /// Data already present; `last_loaded_key` was updated synchronously.
  Ready,
  /// Data must be loaded. Nothing runs until the load is polled.
  Fetching(PendingLoad),
}

impl Evaluation {
  pub fn is_fetching(&self) -> bool {
    matches!(self, Self::Fetching(_))
  }

  /// Drive a pending load, if any, to settlement.
  pub async fn settle(self) -> Result<(), RefetchError> {
    match self {
      Self::Fetching(load) => load.await,
      Self::Unchanged | Self::Ready => Ok(()),
    }
  }
}

/// Load for one navigation key. Resolves with the orchestrator's result after
/// the coordinator state has been updated.
///
/// Dropping it before it settles abandons the load: the coordinator goes back
/// to `Idle` with `last_loaded_key` untouched, so the next evaluation of the
/// same key fetches again.
#[must_use = "the load only runs when awaited"]
pub struct PendingLoad {
  key: String,
  inner: BoxFuture<Result<(), RefetchError>>,
  settled: Arc<AtomicBool>,
  state: Arc<Mutex<CoordinatorState>>,
  generation: u64,
}

impl PendingLoad {
  pub fn key(&self) -> &str {
    &self.key
  }
}

impl Future for PendingLoad {
  type Output = Result<(), RefetchError>;

  fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
    self.inner.as_mut().poll(cx)
  }
}

impl Drop for PendingLoad {
  fn drop(&mut self) {
    if self.settled.load(Ordering::Acquire) {
      return;
    }
    let mut state = self.state.lock();
    if state.generation == self.generation && state.phase == Phase::Fetching {
      tracing::debug!(key = %self.key, "pending load dropped before settling");
      state.phase = Phase::Idle;
    }
  }
}

pub struct FetchCoordinator {
  store: Arc<Store>,
  props: CoordinatorProps,
  state: Arc<Mutex<CoordinatorState>>,
}

impl FetchCoordinator {
  /// Fails with [`RefetchError::MissingStore`] when `ctx` provides no store.
  pub fn new(ctx: &Context, props: CoordinatorProps) -> Result<Self, RefetchError> {
    let store = ctx.store().cloned().ok_or(RefetchError::MissingStore)?;
    Ok(Self { store, props, state: Arc::new(Mutex::new(CoordinatorState::default())) })
  }

  pub fn props(&self) -> &CoordinatorProps {
    &self.props
  }

  pub fn state(&self) -> CoordinatorState {
    self.state.lock().clone()
  }

  pub fn last_loaded_key(&self) -> String {
    self.state.lock().last_loaded_key.clone()
  }

  pub fn on_mount(&self) -> Evaluation {
    self.evaluate(&self.props)
  }

  pub fn on_navigate(&mut self, next: CoordinatorProps) -> Evaluation {
    // A dropped load leaves its key unsettled while idle; the next render retries it.
    let abandoned = {
      let state = self.state.lock();
      state.phase == Phase::Idle && state.last_loaded_key != next.location.key
    };
    let changed = abandoned || needs_evaluation(&self.props, &next);
    self.props = next;
    if changed { self.evaluate(&self.props) } else { Evaluation::Unchanged }
  }

  fn evaluate(&self, props: &CoordinatorProps) -> Evaluation {
    let location = &props.location;
    let mut state = self.state.lock();
    state.phase = Phase::Evaluating;
    state.generation += 1;
    let generation = state.generation;

    let refetch = self.store.read(|global| (props.config.state_selector)(global));
    let loaded = &refetch.loaded_locations;
    let already_loaded_elsewhere =
      location.key != state.last_loaded_key && loaded.is_loaded(&location.key);
    let server_preloaded = state.last_loaded_key == SERVER_RENDER_LOCATION_KEY
      && loaded.is_loaded(SERVER_RENDER_LOCATION_KEY);

    if server_preloaded || already_loaded_elsewhere {
      tracing::debug!(key = %location.key, server_preloaded, "location already loaded");
      state.last_loaded_key = location.key.clone();
      state.phase = Phase::Idle;
      return Evaluation::Ready;
    }

    state.phase = Phase::Fetching;
    drop(state);
    tracing::debug!(key = %location.key, pathname = %location.pathname, "fetching location data");

    let shared = Arc::clone(&self.state);
    let store = Arc::clone(&self.store);
    let routes = props.config.routes.clone();
    let location = location.clone();
    let key = location.key.clone();
    let settled = Arc::new(AtomicBool::new(false));
    let settled_flag = Arc::clone(&settled);
    let inner = Box::pin(async move {
      let result = load_data_for_location(&store, &routes, &location).await;
      {
        let mut state = shared.lock();
        if state.generation == generation {
          state.last_loaded_key = location.key.clone();
          state.phase = Phase::Idle;
        } else {
          tracing::debug!(key = %location.key, "load settled after a newer navigation");
        }
        settled_flag.store(true, Ordering::Release);
      }
      if let Err(ref e) = result {
        tracing::warn!(key = %location.key, error = %e, "location data failed to load");
      }
      result
    });

    Evaluation::Fetching(PendingLoad {
      key,
      inner,
      settled,
      state: Arc::clone(&self.state),
      generation,
    })
  }
}
