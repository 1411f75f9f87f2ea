mod balance;
mod conversion;
mod money;
mod rates;
mod user;

pub use balance::*;
pub use conversion::*;
pub use money::*;
pub use rates::*;
pub use user::*;
