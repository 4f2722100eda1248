//! Named, independently seeded random-number streams.
//!
//! Every model component draws from its own stream (`MovementRng`, `TransmissionRng`, ...)
//! so that adding draws to one component does not shift the sequence seen by another. All
//! streams derive from one base seed, which makes a run reproducible per seed.
mod context_ext;
mod macros;

use std::any::{Any, TypeId};
use std::cell::RefCell;

pub use context_ext::ContextRandomExt;
pub use macros::define_rng;

use crate::rand::SeedableRng;
use crate::{define_data_plugin, HashMap, HashMapExt};

pub trait RngId: Copy + Clone {
    type RngType: SeedableRng;
    fn get_name() -> &'static str;
}

struct RngHolder {
    rng: Box<dyn Any>,
}

// The holders sit in a RefCell so a stream can be drawn from while other data plugins are
// borrowed from the same `&Context`.
struct RngData {
    base_seed: u64,
    rng_holders: RefCell<HashMap<TypeId, RngHolder>>,
}

define_data_plugin!(
    RngPlugin,
    RngData,
    RngData {
        base_seed: 0,
        rng_holders: RefCell::new(HashMap::new()),
    }
);
