pub mod command;
pub mod config;
pub mod device;
pub mod gateway;
pub mod lifecycle;
pub mod queue;
pub mod strip;
pub mod worker;

pub mod prelude {
    pub use crate::{
        command::Command,
        config::{ColorOrder, Config, Pin},
        device::{FrameLog, LedDevice, SimulatedDevice},
        lifecycle::{shutdown_signal, Driver, LifecycleError},
        queue::{command_queue, CommandReceiver, CommandSender, Dequeued, QueueError},
        strip::{SharedStrip, Strip, StripSnapshot},
    };
}
