pub mod state_cache;
pub mod state_manager;
pub mod state_updater;
pub mod update_future_waiting;
pub mod update_latest_start;
pub mod update_loads;
pub mod update_route_costs;
pub mod update_route_skills;
