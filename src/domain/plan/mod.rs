// Plan status domain module
// Contains the plan status record aggregate, its status value object, and
// the events it produces

pub mod events;
pub mod record;
pub mod value_objects;

pub use events::PlanEvent;
pub use record::{read_plan_status, PlanStatusRecord};
pub use value_objects::PlanStatus;
