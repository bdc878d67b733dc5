pub mod drp_trait;
pub mod manager;

pub use drp_trait::Drp;
pub use manager::StateManager;
