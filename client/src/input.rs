//! Input sources that turn key presses into movement directions

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::Direction;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::interval;

/// Maps a key name to a direction. Arrow names, WASD and vi keys are
/// accepted, case-insensitively.
pub fn parse_direction(key: &str) -> Option<Direction> {
    match key.trim().to_ascii_lowercase().as_str() {
        "left" | "arrowleft" | "a" | "h" => Some(Direction::Left),
        "right" | "arrowright" | "d" | "l" => Some(Direction::Right),
        "up" | "arrowup" | "w" | "k" => Some(Direction::Up),
        "down" | "arrowdown" | "s" | "j" => Some(Direction::Down),
        _ => None,
    }
}

/// Every recognised key on one line, in order. Unknown words are skipped.
pub fn parse_line(line: &str) -> Vec<Direction> {
    line.split_whitespace().filter_map(parse_direction).collect()
}

/// Reads directions from stdin, one or more keys per line. The channel
/// closes at end of input.
pub fn spawn_stdin_reader(tx: mpsc::UnboundedSender<Direction>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    for dir in parse_line(&line) {
                        if tx.send(dir).is_err() {
                            return;
                        }
                    }
                }
                Ok(None) => {
                    info!("Input closed");
                    return;
                }
                Err(e) => {
                    debug!("Failed to read input: {}", e);
                    return;
                }
            }
        }
    })
}

/// Emits a random direction every `period`, standing in for a player.
pub fn spawn_bot(tx: mpsc::UnboundedSender<Direction>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::from_entropy();
        let mut ticker = interval(period);

        loop {
            ticker.tick().await;
            let dir = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
            if tx.send(dir).is_err() {
                return;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_direction_aliases() {
        assert_eq!(parse_direction("left"), Some(Direction::Left));
        assert_eq!(parse_direction("ArrowRight"), Some(Direction::Right));
        assert_eq!(parse_direction(" W "), Some(Direction::Up));
        assert_eq!(parse_direction("j"), Some(Direction::Down));
        assert_eq!(parse_direction("jump"), None);
        assert_eq!(parse_direction(""), None);
    }

    #[test]
    fn test_parse_line_keeps_order() {
        assert_eq!(
            parse_line("d d x s"),
            vec![Direction::Right, Direction::Right, Direction::Down]
        );
        assert!(parse_line("   ").is_empty());
    }

    #[tokio::test]
    async fn test_bot_sends_directions() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let bot = spawn_bot(tx, Duration::from_millis(5));

        for _ in 0..3 {
            assert!(rx.recv().await.is_some());
        }

        drop(rx);
        let _ = tokio::time::timeout(Duration::from_millis(100), bot).await;
    }
}
