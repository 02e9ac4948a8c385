pub mod session;

pub use session::{require_authenticated, session_middleware, CurrentUser};
