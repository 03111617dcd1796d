mod bootstrap;
mod login;
mod password;
mod users;

pub use bootstrap::*;
pub use login::*;
pub use password::*;
pub use users::*;
