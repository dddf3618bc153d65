pub mod insertion_cache;
pub mod insertion_listener;
pub mod insertion_params;
pub mod noise;
pub mod regret_insertion;
pub mod scoring;
