pub mod setup;
pub mod status;
pub mod update;
