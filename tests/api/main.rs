mod accounts;
mod health;
mod helpers;
mod newsletters;
mod routing;
mod static_files;
