mod account;
mod account_email;
mod data_url;
mod newsletter;
mod username;

pub use account::*;
pub use account_email::*;
pub use data_url::*;
pub use newsletter::*;
pub use username::*;
