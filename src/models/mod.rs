pub mod billing;
pub mod faq;
pub mod user;

pub use billing::{BillingAddress, NewBillingAddress, Payment};
pub use faq::Faq;
pub use user::{NewUser, Role, User, UserResponse};
