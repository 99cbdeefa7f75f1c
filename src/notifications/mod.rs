pub mod channel;
pub mod dispatcher;
pub mod kinds;

pub use channel::DeliveryChannel;
pub use dispatcher::{NotificationDispatcher, NotificationEvent, NotificationSubject};
pub use kinds::NotificationKind;
