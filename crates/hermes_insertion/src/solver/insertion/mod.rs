pub mod activity_insertion_costs;
pub mod break_insertion;
pub mod feasibility;
pub mod inserter;
pub mod insertion_context;
pub mod insertion_data;
pub mod insertion_event;
pub mod job_insertion_calculator;
pub mod service_insertion;
pub mod shipment_insertion;
