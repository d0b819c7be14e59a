pub mod timestamp;
pub mod trade;
pub mod trading;

pub use timestamp::{format_wall_clock, parse_wall_clock};
pub use trade::*;
pub use trading::*;
