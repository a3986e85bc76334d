pub mod demolition;
pub mod events;
pub mod production;
pub mod starvation;
pub mod upgrade;

pub use demolition::DemolitionReport;
pub use events::{ActiveEvent, EventKind, TradeOffer};
pub use production::TickReport;
pub use starvation::FoodReport;
