use std::any::TypeId;
use std::cell::RefMut;

use log::trace;

use crate::context::Context;
use crate::hashing::hash_str;
use crate::rand::SeedableRng;
use crate::random::{RngHolder, RngId, RngPlugin};

/// Returns the stream for `R`, creating it from the base seed on first use.
///
/// # Panics
///
/// If `init_random` was never called, or if the stream is already borrowed by an enclosing
/// `sample` call.
fn get_rng<R: RngId + 'static>(context: &Context) -> RefMut<'_, R::RngType> {
    let data_container = context.get_data(RngPlugin);

    let rng_holders = data_container
        .rng_holders
        .try_borrow_mut()
        .expect("random streams cannot be sampled re-entrantly");
    RefMut::map(rng_holders, |holders| {
        holders
            .entry(TypeId::of::<R>())
            .or_insert_with(|| {
                trace!(
                    "creating RNG {} (base seed {})",
                    R::get_name(),
                    data_container.base_seed
                );
                let seed = data_container
                    .base_seed
                    .wrapping_add(hash_str(R::get_name()));
                RngHolder {
                    rng: Box::new(R::RngType::seed_from_u64(seed)),
                }
            })
            .rng
            .downcast_mut::<R::RngType>()
            .expect("RNG holder has the wrong type")
    })
}

pub trait ContextRandomExt {
    /// Sets the base seed and discards every existing stream, so each is re-seeded on
    /// next use.
    fn init_random(&mut self, base_seed: u64);

    /// Applies `sampler` to the stream identified by `R`.
    fn sample<R: RngId + 'static, T>(
        &self,
        rng_id: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T;
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random module with base seed {base_seed}");
        let data_container = self.get_data_mut(RngPlugin);
        data_container.base_seed = base_seed;
        data_container.rng_holders.get_mut().clear();
    }

    fn sample<R: RngId + 'static, T>(
        &self,
        _rng_id: R,
        sampler: impl FnOnce(&mut R::RngType) -> T,
    ) -> T {
        let mut rng = get_rng::<R>(self);
        sampler(&mut rng)
    }
}
