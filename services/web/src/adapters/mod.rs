pub mod auth;
pub mod db;
pub mod storage;

pub use auth::SupabaseAuthAdapter;
pub use db::DbAdapter;
pub use storage::SupabaseStorageAdapter;
