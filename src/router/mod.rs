//! Route table, current location and the navigator that ties them to the
//! guard chain.

mod location;
mod navigator;
mod routes;

pub use location::{Location, MemoryLocation};
pub use navigator::{CurrentRoute, NavigationOutcome, Navigator};
pub use routes::{Route, RouteMeta, RouteTable, Target};
