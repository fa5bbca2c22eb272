//! Database Models

// Serde helpers
pub mod serde_helpers;

// Auth
pub mod user;

// Catalog
pub mod product;

// Orders
pub mod order;

// Re-exports
pub use order::{
    Order, OrderCreateRequest, OrderDetail, OrderId, OrderLine, OrderLineDetail, OrderLineInput,
    OrderStatus, OrderUpdate,
};
pub use product::{Category, Product, ProductCreate, ProductId, ProductUpdate};
pub use user::{LoginRequest, Role, SignupRequest, User, UserId, UserResponse};
