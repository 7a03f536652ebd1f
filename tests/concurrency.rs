use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use common::RGB8;
use led_driver::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

mod support;

use support::{running_driver, running_driver_with, wait_until};

const LED_COUNT: usize = 12;
const PRODUCERS: usize = 8;
const COMMANDS_PER_PRODUCER: usize = 200;

fn random_command(rng: &mut impl Rng) -> Command {
    let color = RGB8::new(rng.gen(), rng.gen(), rng.gen());
    match rng.gen_range(0..10) {
        // Indices run off both ends of the strip.
        0..=4 => Command::set_pixel(rng.gen_range(-2..LED_COUNT as i64 + 2), color),
        5 | 6 => {
            let pixels: Vec<_> = (0..rng.gen_range(0..5))
                .map(|_| (rng.gen_range(-1..LED_COUNT as i64 + 1), color))
                .collect();
            Command::set_pixels(pixels)
        }
        7 => Command::set_brightness(rng.gen_range(-1.0..2.0)),
        _ => Command::Show,
    }
}

/// Concurrent producers end up with exactly the state a single producer
/// would reach replaying the commands in enqueue order.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_producers_match_sequential_replay() {
    // Large enough that producers never outrun the worker into a full queue.
    let (driver, log) = running_driver_with(Config {
        led_count: LED_COUNT,
        queue_capacity: PRODUCERS * COMMANDS_PER_PRODUCER + 1,
        ..Config::default()
    });
    let enqueued = Arc::new(Mutex::new(Vec::new()));

    let producers = (0..PRODUCERS)
        .map(|producer| {
            let driver = driver.clone();
            let enqueued = enqueued.clone();
            let mut rng = StdRng::seed_from_u64(producer as u64);
            let commands: Vec<_> = (0..COMMANDS_PER_PRODUCER)
                .map(|_| (random_command(&mut rng), rng.gen_bool(0.2)))
                .collect();

            tokio::spawn(async move {
                for (command, pause) in commands {
                    {
                        // Record and enqueue atomically so the record matches
                        // queue order.
                        let mut enqueued = enqueued.lock().unwrap();
                        driver.submit(command.clone()).unwrap();
                        enqueued.push(command);
                    }
                    if pause {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect::<Vec<_>>();

    for producer in producers {
        producer.await.unwrap();
    }

    driver.submit(Command::Show).unwrap();
    enqueued.lock().unwrap().push(Command::Show);

    let expected = enqueued.lock().unwrap().clone();
    assert_eq!(expected.len(), PRODUCERS * COMMANDS_PER_PRODUCER + 1);

    // Replay on a reference strip.
    let reference_device = SimulatedDevice::new();
    let reference_log = reference_device.log();
    let mut reference = Strip::new(
        LED_COUNT,
        Config::default().brightness,
        Box::new(reference_device),
    );
    for command in &expected {
        command.apply(&mut reference).unwrap();
    }

    let expected_flushes = reference_log.flush_count();
    tokio::time::timeout(Duration::from_secs(5), async {
        while log.flush_count() < expected_flushes {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("worker fell behind");

    assert_eq!(log.frames(), reference_log.frames());
    assert_eq!(driver.strip().lock().await.snapshot(), reference.snapshot());
    assert_eq!(driver.queue_size(), 0);

    driver.shutdown().await;
}

/// Readers holding the strip lock never see a batch half applied.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reads_never_observe_partial_commands() {
    let (driver, _) = running_driver(LED_COUNT);

    let writer = {
        let driver = driver.clone();
        tokio::spawn(async move {
            for shade in 0..=255u8 {
                let color = RGB8::new(shade, shade, shade);
                let batch = (0..LED_COUNT as i64).map(|i| (i, color));
                driver.submit(Command::set_pixels(batch)).unwrap();
                driver.submit(Command::set_brightness(shade as f64 / 255.0)).unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let reader = {
        let driver = driver.clone();
        tokio::spawn(async move {
            let mut reads = 0;
            while reads < 500 {
                let snapshot = driver.strip().lock().await.snapshot();
                let first = snapshot.pixels[0];
                assert!(snapshot.pixels.iter().all(|p| *p == first), "torn read {snapshot:?}");
                assert!((0.0..=1.0).contains(&snapshot.brightness));

                let status = driver.status_report().await;
                assert!((0.0..=1.0).contains(&status.brightness));
                reads += 1;
                tokio::task::yield_now().await;
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();

    let last = RGB8::new(255, 255, 255);
    wait_until(|| async { driver.strip().lock().await.snapshot().brightness == 1.0 }).await;
    assert!(driver.strip().lock().await.snapshot().pixels.iter().all(|p| *p == last));

    driver.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_with_backlog_blanks_strip() {
    let (driver, log) = running_driver(LED_COUNT);

    for i in 0..500 {
        driver
            .submit(Command::set_pixel(i % LED_COUNT as i64, RGB8::new(200, 10, 10)))
            .unwrap();
        driver.submit(Command::Show).unwrap();
    }

    let started = tokio::time::Instant::now();
    driver.shutdown().await;
    assert!(started.elapsed() < Duration::from_secs(2));

    assert_eq!(log.last_frame().unwrap(), vec![RGB8::default(); LED_COUNT]);
    assert_eq!(
        driver.strip().lock().await.snapshot().pixels,
        vec![RGB8::default(); LED_COUNT]
    );
}
