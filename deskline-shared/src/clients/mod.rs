pub mod api;
pub mod storage;

pub use api::ApiClient;
pub use storage::LocalStore;
