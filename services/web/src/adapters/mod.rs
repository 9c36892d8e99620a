pub mod backend;
pub mod cookies;
pub mod flash;

pub use backend::HttpBackend;
pub use cookies::CookieStore;
pub use flash::FlashNotifier;
