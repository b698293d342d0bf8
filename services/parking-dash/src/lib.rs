// services/parking-dash/src/lib.rs
//
// Parking occupancy dashboard

pub mod api;
pub mod config;
pub mod layout;
pub mod mock;
pub mod poller;
pub mod presentation;
pub mod session;
pub mod state;
pub mod ui;

pub use api::{ApiClient, ParkingDataSource};
pub use mock::MockDataSource;
pub use state::DashboardState;
