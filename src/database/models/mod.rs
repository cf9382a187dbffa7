pub mod access_level;
pub mod address;
pub mod product;
pub mod sale;
pub mod store;
pub mod user;

pub use access_level::{AccessLevel, AccessLevelWithUsers};
pub use address::{Address, AddressChanges, NewAddress};
pub use product::{NewProduct, MAX_AMOUNT, Product, ProductChanges, ProductWithStore};
pub use sale::{Sale, SaleDetail, SaleItem, SaleLine};
pub use store::{Store, StoreChanges, StoreListing, StoreWithProducts};
pub use user::{NewUser, User, UserChanges, UserProfile, UserSummary, UserWithRoles};
