pub mod error;
pub mod poller;
pub mod session;
pub mod spin;
pub mod sync;

pub use error::{ErrorKind, SessionError};
pub use poller::{ChatEvent, run_poll_loop};
pub use session::{Session, SessionConfig};
