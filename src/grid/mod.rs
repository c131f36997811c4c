// private sub-modules defined in other files
mod array2d;
mod direction;
mod view;

// exports identifiers from private sub-modules in the current module namespace
pub use self::array2d::Grid;
pub use self::direction::{code, direction_distances, distance_2d, in_grid, DI, DJ, UPWARD};
pub use self::view::{GridView, GridViewMut};
