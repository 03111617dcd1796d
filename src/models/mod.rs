mod license;
mod settings;
mod user;

pub use license::*;
pub use settings::*;
pub use user::*;
