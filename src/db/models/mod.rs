//! Data model records
//!
//! Plain serializable rows. Derived values (token validity, line
//! subtotals) are pure functions over these records, never mutating
//! methods.

pub mod address;
pub mod cart;
pub mod order;
pub mod product;
pub mod token;

pub use address::{Address, AddressInput};
pub use cart::CartLine;
pub use order::{
    Order, OrderCreate, OrderDetail, OrderItem, OrderItemCreate, OrderStatus, PaymentMethod,
};
pub use product::{Product, ProductCreate, ProductStatus};
pub use token::PaymentConfirmationToken;
