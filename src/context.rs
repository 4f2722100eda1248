//! The simulation `Context`.
//!
//! `Context` owns time, the queue of pending plans, per-type data containers ("data
//! plugins") and event subscriptions. Model components never call each other directly:
//! they register plans at `init` time and share state through data plugins.
use std::any::{Any, TypeId};
use std::collections::VecDeque;
use std::rc::Rc;

use log::{error, trace};

use crate::error::MalariaError;
use crate::plan::Queue;
use crate::{HashMap, HashMapExt};

/// Plans scheduled for the same time run in phase order, then in the order they were added.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExecutionPhase {
    First,
    Normal,
    Last,
}

/// A type that can provide a data container to be held by `Context`.
pub trait DataPlugin: Any {
    type DataContainer;

    fn create_data_container() -> Self::DataContainer;
}

/// Defines a new type for storing data in `Context`.
#[macro_export]
macro_rules! define_data_plugin {
    ($plugin:ident, $data_container:ty, $default:expr) => {
        struct $plugin;

        impl $crate::context::DataPlugin for $plugin {
            type DataContainer = $data_container;

            fn create_data_container() -> Self::DataContainer {
                $default
            }
        }
    };
}
pub use define_data_plugin;

/// Marker for types that can be emitted through `Context::emit_event`.
pub trait SimulationEvent: Clone + 'static {}

type Callback = dyn FnOnce(&mut Context);
type EventHandler<E> = dyn Fn(&mut Context, E);

pub struct Context {
    plan_queue: Queue<Box<Callback>, ExecutionPhase>,
    callback_queue: VecDeque<Box<Callback>>,
    event_handlers: HashMap<TypeId, Box<dyn Any>>,
    data_plugins: HashMap<TypeId, Box<dyn Any>>,
    current_time: f64,
    shutdown_requested: bool,
    failure: Option<MalariaError>,
}

impl Context {
    #[must_use]
    pub fn new() -> Context {
        Context {
            plan_queue: Queue::new(),
            callback_queue: VecDeque::new(),
            event_handlers: HashMap::new(),
            data_plugins: HashMap::new(),
            current_time: 0.0,
            shutdown_requested: false,
            failure: None,
        }
    }

    /// Adds a plan to run at `time` in the `Normal` phase.
    ///
    /// # Panics
    ///
    /// If `time` is NaN, infinite, or earlier than the current time.
    pub fn add_plan(&mut self, time: f64, callback: impl FnOnce(&mut Context) + 'static) {
        self.add_plan_with_phase(time, callback, ExecutionPhase::Normal)
    }

    /// Adds a plan to run at `time` in the given phase.
    ///
    /// # Panics
    ///
    /// If `time` is NaN, infinite, or earlier than the current time.
    pub fn add_plan_with_phase(
        &mut self,
        time: f64,
        callback: impl FnOnce(&mut Context) + 'static,
        phase: ExecutionPhase,
    ) {
        assert!(
            !time.is_nan() && !time.is_infinite() && time >= self.current_time,
            "Time is invalid"
        );
        self.plan_queue.add_plan(time, Box::new(callback), phase);
    }

    /// Queues a callback to run before the next plan.
    pub fn queue_callback(&mut self, callback: impl FnOnce(&mut Context) + 'static) {
        self.callback_queue.push_back(Box::new(callback));
    }

    /// Registers a handler that receives every emitted event of type `E`.
    pub fn subscribe_to_event<E: SimulationEvent>(
        &mut self,
        handler: impl Fn(&mut Context, E) + 'static,
    ) {
        let handlers = self
            .event_handlers
            .entry(TypeId::of::<E>())
            .or_insert_with(|| Box::<Vec<Rc<EventHandler<E>>>>::default());
        handlers
            .downcast_mut::<Vec<Rc<EventHandler<E>>>>()
            .expect("event handler registry holds the wrong type")
            .push(Rc::new(handler));
    }

    /// Queues one callback per subscriber of `E`. Handlers run after the current plan, in
    /// subscription order.
    pub fn emit_event<E: SimulationEvent>(&mut self, event: E) {
        let Some(handlers) = self.event_handlers.get(&TypeId::of::<E>()) else {
            return;
        };
        let handlers = handlers
            .downcast_ref::<Vec<Rc<EventHandler<E>>>>()
            .expect("event handler registry holds the wrong type")
            .clone();
        for handler in handlers {
            let event = event.clone();
            self.queue_callback(move |context| handler(context, event));
        }
    }

    /// Returns the data container for `T`, creating it on first use.
    pub fn get_data_mut<T: DataPlugin>(&mut self, _plugin: T) -> &mut T::DataContainer {
        self.data_plugins
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(T::create_data_container()))
            .downcast_mut::<T::DataContainer>()
            .expect("data plugin holds the wrong type")
    }

    /// Returns the data container for `T` if it has been created.
    #[must_use]
    pub fn try_get_data<T: DataPlugin>(&self, _plugin: T) -> Option<&T::DataContainer> {
        self.data_plugins
            .get(&TypeId::of::<T>())
            .and_then(|data| data.downcast_ref::<T::DataContainer>())
    }

    /// Returns the data container for `T`.
    ///
    /// # Panics
    ///
    /// If the container was never created with `get_data_mut`.
    #[must_use]
    pub fn get_data<T: DataPlugin>(&self, plugin: T) -> &T::DataContainer {
        self.try_get_data(plugin).unwrap_or_else(|| {
            panic!(
                "data plugin {} is not initialized",
                std::any::type_name::<T>()
            )
        })
    }

    #[must_use]
    pub fn get_current_time(&self) -> f64 {
        self.current_time
    }

    /// Stops the event loop once the current callback returns.
    pub fn shutdown(&mut self) {
        trace!("shutdown requested at time {}", self.current_time);
        self.shutdown_requested = true;
    }

    /// Records a fatal error and shuts the simulation down. Only the first failure is kept.
    pub fn fail(&mut self, failure: MalariaError) {
        error!("simulation failed at time {}: {failure}", self.current_time);
        if self.failure.is_none() {
            self.failure = Some(failure);
        }
        self.shutdown();
    }

    /// Takes the recorded failure, if any.
    pub fn take_failure(&mut self) -> Option<MalariaError> {
        self.failure.take()
    }

    /// Runs plans and callbacks until there are none left or `shutdown` is called.
    pub fn execute(&mut self) {
        trace!("entering event loop");
        loop {
            if self.shutdown_requested {
                self.plan_queue.clear();
                self.callback_queue.clear();
                break;
            }

            if let Some(callback) = self.callback_queue.pop_front() {
                callback(self);
                continue;
            }

            match self.plan_queue.get_next_plan() {
                Some(plan) => {
                    self.current_time = plan.time;
                    #[cfg(feature = "progress_bar")]
                    crate::progress::update_timeline_progress(self.current_time);
                    (plan.data)(self);
                }
                None => break,
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
