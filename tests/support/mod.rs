#![allow(dead_code)]

use std::{future::Future, sync::Arc, time::Duration};

use led_driver::prelude::*;

/// A driver over a simulated strip, worker already running.
pub fn running_driver(led_count: usize) -> (Arc<Driver>, FrameLog) {
    running_driver_with(Config {
        led_count,
        ..Config::default()
    })
}

pub fn running_driver_with(config: Config) -> (Arc<Driver>, FrameLog) {
    let _ = env_logger::try_init();

    let device = SimulatedDevice::new();
    let log = device.log();
    let driver = Arc::new(Driver::new(config, Box::new(device)));
    driver.start().expect("fresh driver should start");
    (driver, log)
}

/// Poll `condition` until it holds, failing the test after a second.
pub async fn wait_until<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
