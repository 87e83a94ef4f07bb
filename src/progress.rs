//! Progress engine: XP → level resolution and snapshot → view computation.
//!
//! Pure functions over a replace-only [`ProgressSnapshot`]. The snapshot
//! arrives either from `GET /api/progress` or assembled from the progress
//! fields embedded in a chat reply; the client never patches it, every
//! render starts from a full snapshot.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Product-wide XP goal used when a payload omits `goal`.
pub const DEFAULT_XP_GOAL: u32 = 300;

/// Gaps are rendered as missions, capped to the first entries.
pub const MISSIONS_CAP: usize = 3;

// -- Level thresholds -------------------------------------------------------

/// One row of the static level table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelThreshold {
    pub level: u32,
    pub label: &'static str,
    pub xp_floor: u32,
}

/// Static ascending level table. Strictly increasing in both `level` and
/// `xp_floor`; the zero-floor head entry guarantees `resolve_level` always
/// matches.
pub static LEVEL_THRESHOLDS: Lazy<Vec<LevelThreshold>> = Lazy::new(|| {
    vec![
        LevelThreshold { level: 0, label: "Diagnóstico", xp_floor: 0 },
        LevelThreshold { level: 1, label: "Fundamentos", xp_floor: 50 },
        LevelThreshold { level: 2, label: "Prática Guiada", xp_floor: 100 },
        LevelThreshold { level: 3, label: "Desafios Avançados", xp_floor: 150 },
        LevelThreshold { level: 4, label: "Mentoria", xp_floor: 200 },
    ]
});

/// Resolve the highest threshold whose floor is at or below `xp`.
///
/// The table must be sorted ascending by `xp_floor` and start at floor 0
/// (the built-in [`LEVEL_THRESHOLDS`] does); with that invariant this is
/// total and monotonically non-decreasing in `xp`.
pub fn resolve_level(xp: u32, thresholds: &[LevelThreshold]) -> &LevelThreshold {
    thresholds
        .iter()
        .rev()
        .find(|t| t.xp_floor <= xp)
        .or_else(|| thresholds.first())
        .expect("level table has a zero-floor entry")
}

// -- Snapshot ---------------------------------------------------------------

/// Position on the learning path, as the backend reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPosition {
    pub level: u32,
    pub label: String,
    #[serde(rename = "xpToNext")]
    pub xp_to_next: u32,
}

impl PathPosition {
    /// Compute the position locally from an XP total, for replies that
    /// carry XP but no `pathPosition`.
    pub fn from_xp(xp: u32) -> Self {
        let table = &*LEVEL_THRESHOLDS;
        let resolved = resolve_level(xp, table);
        let xp_to_next = table
            .iter()
            .find(|t| t.xp_floor > xp)
            .map(|next| next.xp_floor - xp)
            .unwrap_or(0);
        PathPosition {
            level: resolved.level,
            label: resolved.label.to_string(),
            xp_to_next,
        }
    }
}

impl Default for PathPosition {
    fn default() -> Self {
        PathPosition::from_xp(0)
    }
}

/// One progress event, tagged on the wire as
/// `{"type": ..., "payload": {...}, "timestamp": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl RecentEvent {
    /// Render the event for display by its tag. `xp` events show the signed
    /// delta and reason, `grade` events the numeric score, anything else a
    /// generic label carrying the raw tag.
    pub fn display_label(&self) -> String {
        match self.kind.as_str() {
            "xp" => {
                let delta = self.payload.get("xp").and_then(Value::as_i64).unwrap_or(0);
                match self.payload.get("reason").and_then(Value::as_str) {
                    Some(reason) if !reason.is_empty() => {
                        format!("{delta:+} XP · {reason}")
                    }
                    _ => format!("{delta:+} XP"),
                }
            }
            "grade" => {
                let score = self
                    .payload
                    .get("score")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.0);
                format!("Nota {score}")
            }
            other => format!("Evento: {other}"),
        }
    }
}

/// Complete, replace-only progress payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProgressSnapshot {
    #[serde(default)]
    pub xp: u32,
    #[serde(default = "default_goal")]
    pub goal: u32,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default, rename = "pathPosition")]
    pub path_position: PathPosition,
    #[serde(default)]
    pub gaps: Vec<String>,
    #[serde(default, rename = "recentEvents")]
    pub recent_events: Vec<RecentEvent>,
}

fn default_goal() -> u32 {
    DEFAULT_XP_GOAL
}

impl Default for ProgressSnapshot {
    fn default() -> Self {
        ProgressSnapshot {
            xp: 0,
            goal: DEFAULT_XP_GOAL,
            badges: Vec::new(),
            path_position: PathPosition::default(),
            gaps: Vec::new(),
            recent_events: Vec::new(),
        }
    }
}

impl ProgressSnapshot {
    /// Assemble a full snapshot from the partial progress fields of a chat
    /// reply. `total_xp` and `badges` live on the response envelope, the
    /// rest inside its `progress` object; anything absent falls back to the
    /// product defaults or a locally computed path position.
    pub fn from_chat_reply(
        total_xp: u32,
        badges: Option<Vec<String>>,
        payload: Option<crate::api::ProgressPayload>,
    ) -> Self {
        let payload = payload.unwrap_or_default();
        ProgressSnapshot {
            xp: total_xp,
            goal: payload.goal.unwrap_or(DEFAULT_XP_GOAL),
            badges: badges.unwrap_or_default(),
            path_position: payload
                .path_position
                .unwrap_or_else(|| PathPosition::from_xp(total_xp)),
            gaps: payload.gaps,
            recent_events: payload.recent_events,
        }
    }
}

// -- View computation -------------------------------------------------------

/// Everything the view surfaces need, computed once per snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub xp: u32,
    pub goal: u32,
    /// Percentage toward the goal, clamped to `[0, 100]`.
    pub percent: f64,
    pub level: u32,
    pub label: String,
    pub xp_to_next: u32,
    pub badges: Vec<String>,
    /// First [`MISSIONS_CAP`] gaps, rendered as missions.
    pub missions: Vec<String>,
    pub events: Vec<String>,
}

impl ProgressView {
    /// Pure view computation. Guards the division: a goal of zero (only
    /// possible through a hand-crafted snapshot) yields 0 %.
    pub fn compute(snapshot: &ProgressSnapshot) -> Self {
        let percent = if snapshot.goal == 0 {
            0.0
        } else {
            (f64::from(snapshot.xp) / f64::from(snapshot.goal) * 100.0).clamp(0.0, 100.0)
        };
        ProgressView {
            xp: snapshot.xp,
            goal: snapshot.goal,
            percent,
            level: snapshot.path_position.level,
            label: snapshot.path_position.label.clone(),
            xp_to_next: snapshot.path_position.xp_to_next,
            badges: snapshot.badges.clone(),
            missions: snapshot.gaps.iter().take(MISSIONS_CAP).cloned().collect(),
            events: snapshot
                .recent_events
                .iter()
                .map(RecentEvent::display_label)
                .collect(),
        }
    }
}
