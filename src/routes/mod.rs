mod accounts;
mod health_check;
mod newsletters;
mod pages;

pub use accounts::*;
pub use health_check::*;
pub use newsletters::*;
pub use pages::*;
