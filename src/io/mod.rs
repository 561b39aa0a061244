pub mod config_io;
pub mod lock;
pub mod remote;
pub mod workspace_io;
