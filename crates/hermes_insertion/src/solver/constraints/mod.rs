pub mod break_vehicle_constraint;
pub mod constraint;
pub mod constraint_manager;
pub mod load_constraint;
pub mod maximum_activities_constraint;
pub mod skill_constraint;
pub mod switch_feasibility_constraint;
pub mod time_window_constraint;
pub mod vehicle_fixed_cost_constraint;
