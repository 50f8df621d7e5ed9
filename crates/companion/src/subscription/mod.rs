#![forbid(unsafe_code)]

mod handle;
mod router;

pub use handle::Subscription;
pub use router::EventSubscription;
