mod product;
mod user;

pub use product::{NewProduct, Product, ProductPatch};
pub use user::{NewUser, PublicUser, Role, UnknownRole, User};
