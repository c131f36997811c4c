// private sub-modules defined in other files
mod channels;
mod fill_sinks;
mod flow_direction;
mod strahler;
mod upslope;

// exports identifiers from private sub-modules in the current module namespace
pub use self::channels::{channels, ChannelNetwork};
pub use self::fill_sinks::fill_sinks;
pub use self::flow_direction::flow_direction;
pub use self::strahler::strahler;
pub use self::upslope::{upslope, watershed};
