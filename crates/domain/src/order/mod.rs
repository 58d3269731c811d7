//! Order aggregate, line items, and the order state machine.

mod aggregate;
mod line_item;
mod number;
mod state;

pub use aggregate::{Order, PlaceOrder, RequestedItem, ShippingDetails};
pub use line_item::LineItem;
pub use number::{OrderNumber, OrderNumberGenerator};
pub use state::OrderState;
