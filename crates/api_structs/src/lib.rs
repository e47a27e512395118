mod history;
mod status;

pub mod dtos {
    pub use crate::history::dtos::*;
}

pub use crate::history::api::*;
pub use crate::status::api::*;
