pub mod flows;
pub mod helpers;
