mod assignment;
mod classroom;
mod duty;
mod fixed_assignment;
mod ids;
mod instance;
mod lesson_group;
mod location;
mod subject;
mod teacher;
mod time_grid;

pub use assignment::*;
pub use classroom::*;
pub use duty::*;
pub use fixed_assignment::*;
pub use ids::*;
pub use instance::*;
pub use lesson_group::*;
pub use location::*;
pub use subject::*;
pub use teacher::*;
pub use time_grid::*;
