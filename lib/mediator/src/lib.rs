#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

pub mod error;
mod mediator;

pub use mediator::{Mediator, MediatorOptions};

pub mod model {
    pub use mediator_model::*;
}

pub mod common {
    pub use mediator_common::*;
}

pub mod engine {
    pub use mediator_engine::*;
}

pub mod storage {
    pub use mediator_storage::*;
}
