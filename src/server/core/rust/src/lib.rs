/* src/server/core/rust/src/lib.rs */

//! Navigation-triggered data loading for server-rendered single-page apps.
//!
//! The server runs [`load_data_for_location`] once for the request URL and
//! ships the resulting store state with the page. On the client a
//! [`FetchCoordinator`] sees the `@@serverRender` entry in the
//! loaded-locations registry and skips the first fetch; afterwards it loads
//! data only for navigation keys the registry has not seen.

pub mod context;
pub mod coordinator;
pub mod errors;
pub mod escape;
pub mod location;
pub mod orchestrator;
pub mod registry;
pub mod routes;
pub mod store;
pub mod template;

// Re-exports for ergonomic use
pub use context::Context;
pub use coordinator::{
  CoordinatorConfig, CoordinatorProps, CoordinatorState, Evaluation, FetchCoordinator,
  PendingLoad, Phase, StateSelector, default_state_selector, needs_evaluation,
};
pub use errors::RefetchError;
pub use escape::escape_json_for_script;
pub use location::{
  Location, SERVER_RENDER_LOCATION_KEY, create_location_from_url, get_url_from_location,
};
pub use orchestrator::load_data_for_location;
pub use registry::{LoadedLocations, REFETCH_STATE_FIELD, RefetchState};
pub use routes::{
  BoxFuture, FetcherRoute, FetcherRoutes, LoaderFn, MatchMode, MatchParams, PathMatcher,
  PatternMatcher, loader,
};
pub use store::{Action, GlobalState, Store};
pub use template::{DEFAULT_HTML_MARKER, DEFAULT_STATE_ID, Template, extract_initial_state};
