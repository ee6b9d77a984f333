pub mod types;

pub use types::{Direction, SlConfig, Strategy, TpConfig};
