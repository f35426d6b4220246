//! Performance checks for the per-tick hot paths

use client::game::Synchronizer;
use server::game::World;
use shared::{delay_line, Direction, Packet, Player, Snapshot};
use std::time::{Duration, Instant};

fn crowded_world(players: usize, coins: usize) -> World {
    let mut world = World::new();
    for i in 0..players {
        let id = world.connect();
        let x = 20.0 + (i % 30) as f32 * 25.0;
        let y = 20.0 + (i / 30) as f32 * 25.0;
        world.place_player(id, x, y);
    }
    for i in 0..coins {
        world.spawn_coin_at(i as f64, (i % 800) as f32, 590.0);
    }
    world
}

/// Benchmarks movement with pairwise collision resolution
#[test]
fn benchmark_handle_input() {
    let mut world = crowded_world(100, 0);
    let iterations = 10_000;
    let start = Instant::now();

    for i in 0..iterations {
        let id = (i % 100) as u32 + 1;
        world.handle_input(id, Direction::ALL[i % 4]);
    }

    let duration = start.elapsed();
    println!(
        "Input handling: {} inputs against 100 players in {:?} ({:.2} μs/input)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(world.players().values().all(Player::in_bounds));
    assert!(duration.as_millis() < 5000);
}

/// Benchmarks coin capture plus snapshot assembly
#[test]
fn benchmark_world_step() {
    let mut world = crowded_world(100, 1000);
    let iterations = 200;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = world.step();
    }

    let duration = start.elapsed();
    println!(
        "World step: 100 players, {} coins × {} ticks in {:?} ({:.2} μs/tick)",
        world.coins().len(),
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // One tick must fit comfortably inside the 50ms budget.
    assert!(duration / iterations < Duration::from_millis(50));
}

/// Benchmarks snapshot encoding and decoding
#[test]
fn benchmark_snapshot_codec() {
    let snapshot = crowded_world(50, 50).snapshot();
    let packet = Packet::State(snapshot);

    let iterations = 2_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let text = packet.encode().unwrap();
        let decoded = Packet::decode(&text).unwrap();
        assert!(decoded.is_some());
    }

    let duration = start.elapsed();
    println!(
        "Snapshot codec: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 5000);
}

/// Benchmarks per-frame interpolation over a full buffer
#[test]
fn benchmark_interpolation() {
    let mut sync = Synchronizer::default();
    let base = crowded_world(100, 20).snapshot();
    let t0 = Instant::now();

    for seq in 1..=20u64 {
        let mut snapshot: Snapshot = base.clone();
        snapshot.seq = seq;
        for player in snapshot.players.values_mut() {
            player.x += seq as f32;
        }
        sync.on_snapshot_received_at(snapshot, t0 + Duration::from_millis(seq * 50));
    }

    let frames = 10_000u64;
    let start = Instant::now();

    for frame in 0..frames {
        let now = t0 + Duration::from_millis(200 + frame % 800);
        assert!(sync.interpolate(now).is_some());
    }

    let duration = start.elapsed();
    println!(
        "Interpolation: {} frames over 100 players in {:?} ({:.2} μs/frame)",
        frames,
        duration,
        duration.as_micros() as f64 / frames as f64
    );

    assert!(duration.as_millis() < 5000);
}

/// Stress tests the delay line with many queued messages
#[test]
fn stress_test_delay_line() {
    tokio_test::block_on(async {
        let (tx, mut rx) = delay_line(Duration::from_millis(10));
        let count = 10_000;
        let start = Instant::now();

        for i in 0..count {
            assert!(tx.send(i));
        }
        drop(tx);

        let mut received = 0;
        while let Some(item) = rx.recv().await {
            assert_eq!(item, received);
            received += 1;
        }

        let duration = start.elapsed();
        println!("Delay line: {} messages in {:?}", count, duration);

        assert_eq!(received, count);
        assert!(duration >= Duration::from_millis(10));
        assert!(duration.as_millis() < 5000);
    });
}
