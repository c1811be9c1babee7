//! Order lifecycle domain model.

pub mod events;
pub mod record;
pub mod signals;
pub mod state;
pub mod value_objects;

pub use events::OrderEvent;
pub use record::OrderRecord;
pub use signals::Signal;
pub use state::OrderStep;
pub use value_objects::{Address, CancelSource, OrderItem, StatusSnapshot, charge_amount};
