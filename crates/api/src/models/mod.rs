//! Domain models for the laundry backend.
//!
//! These types are validated domain objects, separate from the database row
//! types in [`crate::db`] and the wire payloads in [`crate::routes`].

pub mod inventory;
pub mod order;
pub mod session;
pub mod user;

pub use inventory::{ProductType, ProductTypeWithStock, Stock, StockEntry};
pub use order::{
    NewCustomer, NewOrder, NewOrderItem, ORDER_CREATED_BY, ORDER_CREATED_NOTE, Order, OrderDetail,
    OrderEvent, OrderItem, OrderReceipt, OrderTotals,
};
pub use session::{IssuedSession, SessionToken};
pub use user::User;
