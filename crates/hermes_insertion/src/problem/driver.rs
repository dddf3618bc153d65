use crate::define_index_newtype;

define_index_newtype!(DriverIdx, Driver);

/// Identity handed through to cost functions. Drivers carry no constraints
/// of their own.
#[derive(Debug, Clone)]
pub struct Driver {
    external_id: String,
}

impl Driver {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
        }
    }

    pub fn external_id(&self) -> &str {
        &self.external_id
    }
}
