use crate::{define_index_newtype, solver::solution::vehicle_route::VehicleRoute};

define_index_newtype!(RouteIdx, VehicleRoute);
