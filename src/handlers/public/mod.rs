// handlers/public/mod.rs - Public handlers (no identity middleware)
//
// Security Level: none, except the webhook which checks its signature
// Route Prefix: none

mod health;
mod identity;
mod root;
mod webhook;

pub use health::health;
pub use identity::get_user_id;
pub use root::root;
pub use webhook::clerk_webhook;
