pub mod account;
pub mod checkout;

pub use account::AccountService;
pub use checkout::{CheckoutReceipt, CheckoutService};
