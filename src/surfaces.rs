//! View surfaces and the progress board.
//!
//! The board owns a fixed set of named surfaces, bound once at
//! construction (a missing handle is unrepresentable, not a per-render
//! error). Applying a view is idempotent; the last applied view is cached
//! so a surface that was skipped while hidden can be refreshed when its
//! section becomes active.

use std::time::Duration;

use colored::*;

use crate::progress::ProgressView;

/// How long the level-up banner stays on screen.
pub const LEVEL_UP_DISMISS: Duration = Duration::from_secs(3);

/// Names of the render surfaces fed by the progress engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceId {
    Header,
    Sidebar,
    Profile,
    Missions,
}

/// Every surface, for "refresh everything" call sites.
pub const ALL_SURFACES: [SurfaceId; 4] = [
    SurfaceId::Header,
    SurfaceId::Sidebar,
    SurfaceId::Profile,
    SurfaceId::Missions,
];

/// A render target for progress views. Implementations must be idempotent:
/// applying the same view twice yields identical rendered state.
pub trait Surface {
    fn apply(&mut self, view: &ProgressView);
}

/// The fixed surface handles, bound at startup.
pub struct SurfaceSet {
    pub header: Box<dyn Surface>,
    pub sidebar: Box<dyn Surface>,
    pub profile: Box<dyn Surface>,
    pub missions: Box<dyn Surface>,
}

impl SurfaceSet {
    fn get_mut(&mut self, id: SurfaceId) -> &mut dyn Surface {
        match id {
            SurfaceId::Header => self.header.as_mut(),
            SurfaceId::Sidebar => self.sidebar.as_mut(),
            SurfaceId::Profile => self.profile.as_mut(),
            SurfaceId::Missions => self.missions.as_mut(),
        }
    }
}

/// One-shot banner emitted when the resolved level strictly increases.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelUpNotice {
    pub level: u32,
    pub label: String,
    /// How long the frontend should keep the banner visible.
    pub dismiss_after: Duration,
}

/// Sink for level-up notices. The board guarantees the one-shot semantics;
/// dismissal timing is the frontend's concern.
pub trait Notifier {
    fn level_up(&mut self, notice: &LevelUpNotice);
}

/// Applies computed progress views to the bound surfaces.
pub struct ProgressBoard {
    surfaces: SurfaceSet,
    notifier: Box<dyn Notifier>,
    last_view: Option<ProgressView>,
    /// Highest level ever rendered. Stale lower snapshots re-render without
    /// re-arming the notification.
    highest_level: Option<u32>,
}

impl ProgressBoard {
    pub fn new(surfaces: SurfaceSet, notifier: Box<dyn Notifier>) -> Self {
        ProgressBoard {
            surfaces,
            notifier,
            last_view: None,
            highest_level: None,
        }
    }

    /// Write `view` into each requested surface and cache it for lazy
    /// refreshes. Fires the level-up notice at most once per call, only
    /// when the level strictly exceeds every previously rendered one.
    pub fn apply(&mut self, view: ProgressView, targets: &[SurfaceId]) {
        match self.highest_level {
            Some(highest) if view.level > highest => {
                let notice = LevelUpNotice {
                    level: view.level,
                    label: view.label.clone(),
                    dismiss_after: LEVEL_UP_DISMISS,
                };
                self.notifier.level_up(&notice);
                self.highest_level = Some(view.level);
            }
            Some(_) => {}
            None => self.highest_level = Some(view.level),
        }

        for id in targets {
            self.surfaces.get_mut(*id).apply(&view);
        }
        self.last_view = Some(view);
    }

    /// Re-apply the cached view to surfaces whose section just became
    /// active. No notification is ever fired from here. No-op before the
    /// first apply.
    pub fn reapply(&mut self, targets: &[SurfaceId]) {
        if let Some(view) = self.last_view.clone() {
            for id in targets {
                self.surfaces.get_mut(*id).apply(&view);
            }
        }
    }

    pub fn last_view(&self) -> Option<&ProgressView> {
        self.last_view.as_ref()
    }
}

// -- Terminal surfaces ------------------------------------------------------

/// Compact XP counter shown above the chat area.
#[derive(Debug, Default)]
pub struct HeaderSurface;

impl HeaderSurface {
    pub fn line(view: &ProgressView) -> String {
        format!(
            "XP: {}  {}",
            view.xp.to_string().bold(),
            format!("Nível {} · {}", view.level, view.label).dimmed()
        )
    }
}

impl Surface for HeaderSurface {
    fn apply(&mut self, view: &ProgressView) {
        println!("{}", Self::line(view));
    }
}

/// Goal progress bar for the sidebar counter.
#[derive(Debug, Default)]
pub struct SidebarSurface;

impl SidebarSurface {
    pub fn line(view: &ProgressView) -> String {
        const WIDTH: usize = 20;
        let filled = ((view.percent / 100.0) * WIDTH as f64).round() as usize;
        let filled = filled.min(WIDTH);
        let bar = format!("{}{}", "█".repeat(filled), "░".repeat(WIDTH - filled));
        format!("[{bar}] {}/{} XP ({:.0}%)", view.xp, view.goal, view.percent)
    }
}

impl Surface for SidebarSurface {
    fn apply(&mut self, view: &ProgressView) {
        println!("{}", Self::line(view));
    }
}

/// Profile panel: level, badges, recent events.
#[derive(Debug, Default)]
pub struct ProfileSurface;

impl ProfileSurface {
    pub fn lines(view: &ProgressView) -> Vec<String> {
        let mut lines = vec![
            format!("Nível {} · {}", view.level, view.label),
            format!("Faltam {} XP para o próximo nível", view.xp_to_next),
        ];
        if view.badges.is_empty() {
            lines.push("Conquistas: nenhuma ainda".to_string());
        } else {
            lines.push(format!("Conquistas: {}", view.badges.join(", ")));
        }
        for event in &view.events {
            lines.push(format!("  {event}"));
        }
        lines
    }
}

impl Surface for ProfileSurface {
    fn apply(&mut self, view: &ProgressView) {
        for line in Self::lines(view) {
            println!("{line}");
        }
    }
}

/// Missions panel: the first capped gaps as study missions.
#[derive(Debug, Default)]
pub struct MissionsSurface;

impl MissionsSurface {
    pub fn lines(view: &ProgressView) -> Vec<String> {
        if view.missions.is_empty() {
            return vec!["Nenhuma missão pendente.".to_string()];
        }
        view.missions
            .iter()
            .enumerate()
            .map(|(i, gap)| format!("{}. Revisar: {gap}", i + 1))
            .collect()
    }
}

impl Surface for MissionsSurface {
    fn apply(&mut self, view: &ProgressView) {
        for line in Self::lines(view) {
            println!("{line}");
        }
    }
}

/// Prints the level-up banner to the terminal.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn level_up(&mut self, notice: &LevelUpNotice) {
        println!(
            "{}",
            format!("★ Subiu de nível! Nível {} · {}", notice.level, notice.label)
                .bold()
                .yellow()
        );
    }
}

/// Convenience constructor: the four terminal surfaces plus the terminal
/// notifier.
pub fn terminal_board() -> ProgressBoard {
    ProgressBoard::new(
        SurfaceSet {
            header: Box::new(HeaderSurface),
            sidebar: Box::new(SidebarSurface),
            profile: Box::new(ProfileSurface),
            missions: Box::new(MissionsSurface),
        },
        Box::new(TerminalNotifier),
    )
}
