use crate::game::RenderState;
use log::info;

/// Text stand-in for a drawing surface: turns each frame's interpolated
/// state into a one-line HUD and logs it when it changes.
#[derive(Debug, Default)]
pub struct Renderer {
    last_hud: Option<String>,
    frames_rendered: u64,
    frames_skipped: u64,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders one frame. `None` means nothing is renderable yet and the
    /// frame is skipped.
    pub fn render(&mut self, state: Option<&RenderState>, client_id: Option<u32>) {
        let Some(state) = state else {
            self.frames_skipped += 1;
            return;
        };

        self.frames_rendered += 1;
        let hud = hud_line(state, client_id);
        if self.last_hud.as_deref() != Some(hud.as_str()) {
            info!("{}", hud);
            self.last_hud = Some(hud);
        }
    }

    pub fn last_hud(&self) -> Option<&str> {
        self.last_hud.as_deref()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }
}

pub fn hud_line(state: &RenderState, client_id: Option<u32>) -> String {
    let me = client_id.and_then(|id| state.players.get(&id).map(|p| (id, p)));
    let summary = format!(
        "players {} | coins {}",
        state.players.len(),
        state.coins.len()
    );

    match me {
        Some((id, player)) => format!(
            "You: P{} score {} at ({:.0}, {:.0}) | {}",
            id, player.score, player.x, player.y, summary
        ),
        None => format!("Spectating | {}", summary),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Player;

    fn state() -> RenderState {
        let mut state = RenderState::default();
        state.players.insert(
            2,
            Player {
                x: 120.4,
                y: 99.6,
                score: 3,
            },
        );
        state
    }

    #[test]
    fn test_hud_for_local_player() {
        assert_eq!(
            hud_line(&state(), Some(2)),
            "You: P2 score 3 at (120, 100) | players 1 | coins 0"
        );
    }

    #[test]
    fn test_hud_without_local_player() {
        assert_eq!(hud_line(&state(), None), "Spectating | players 1 | coins 0");
        assert_eq!(hud_line(&state(), Some(9)), "Spectating | players 1 | coins 0");
    }

    #[test]
    fn test_not_ready_frames_are_skipped() {
        let mut renderer = Renderer::new();
        renderer.render(None, Some(2));
        renderer.render(Some(&state()), Some(2));
        renderer.render(Some(&state()), Some(2));

        assert_eq!(renderer.frames_skipped(), 1);
        assert_eq!(renderer.frames_rendered(), 2);
        assert!(renderer.last_hud().unwrap().starts_with("You: P2"));
    }
}
