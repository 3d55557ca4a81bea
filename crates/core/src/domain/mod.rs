pub mod identity;
pub mod reply;
pub mod thread;
