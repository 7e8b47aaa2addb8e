pub mod clock;
pub mod countdown;
pub mod handlers;
pub mod repository;

pub use clock::CalendarClock;
