pub mod access_level_service;
pub mod address_service;
pub mod product_service;
pub mod sale_service;
pub mod store_service;
pub mod user_service;

pub use access_level_service::AccessLevelService;
pub use address_service::AddressService;
pub use product_service::ProductService;
pub use sale_service::SaleService;
pub use store_service::StoreService;
pub use user_service::UserService;
