//! Hover lifecycle as an explicit state machine.
//!
//! `HoverScheduler::handle` maps `(state, event)` to `(state, effects)`. It
//! never touches the DOM; the caller interprets the returned [`Effect`]s and
//! feeds asynchronous outcomes (timer, decode, fade) back in as events carrying
//! the generation they were issued for. Outcomes for a generation that is no
//! longer live are dropped.

use crate::config::PreviewConfig;
use crate::eligibility::{covers_intrinsic, passes_early_check};
use crate::geometry::{compute_geometry, OverlayGeometry, Point, Size};

/// Read-only view of the page the scheduler consults while transitioning.
pub trait PreviewHost<T> {
    fn enabled(&self) -> bool;
    fn size_ratio(&self) -> f64;
    fn viewport(&self) -> Size;
    fn resolve(&self, target: &T) -> Option<String>;
    /// Rendered box of the element, if known.
    fn display_size(&self, target: &T) -> Option<Size>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum PreviewState<T> {
    Idle,
    Pending {
        target: T,
        generation: u64,
    },
    Loading {
        target: T,
        url: String,
        generation: u64,
    },
    Visible {
        target: T,
        url: String,
        generation: u64,
        intrinsic: Size,
        geometry: OverlayGeometry,
    },
    Hiding {
        generation: u64,
    },
}

impl<T> PreviewState<T> {
    pub fn target(&self) -> Option<&T> {
        match self {
            PreviewState::Pending { target, .. }
            | PreviewState::Loading { target, .. }
            | PreviewState::Visible { target, .. } => Some(target),
            PreviewState::Idle | PreviewState::Hiding { .. } => None,
        }
    }

    pub fn generation(&self) -> Option<u64> {
        match self {
            PreviewState::Idle => None,
            PreviewState::Pending { generation, .. }
            | PreviewState::Loading { generation, .. }
            | PreviewState::Visible { generation, .. }
            | PreviewState::Hiding { generation } => Some(*generation),
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, PreviewState::Idle)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HoverEvent<T> {
    Enter { target: T, cursor: Point },
    Leave { target: T },
    Move { cursor: Point },
    Scroll,
    /// Settings-driven hide (preview disabled, size changed).
    Dismiss,
    TimerFired { generation: u64 },
    DecodeLoaded { generation: u64, intrinsic: Size },
    DecodeFailed { generation: u64 },
    HideElapsed { generation: u64 },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    StartTimer { generation: u64, delay_ms: u32 },
    CancelTimer,
    /// Create a fresh overlay and start decoding `url` into it.
    LoadImage { generation: u64, url: String },
    Reveal {
        generation: u64,
        geometry: OverlayGeometry,
    },
    Reposition {
        generation: u64,
        geometry: OverlayGeometry,
    },
    /// Fade to transparent and report `HideElapsed` after `fade_ms`.
    FadeOut { generation: u64, fade_ms: u32 },
    RemoveOverlay { generation: u64 },
}

#[derive(Debug)]
pub struct HoverScheduler<T> {
    config: PreviewConfig,
    state: PreviewState<T>,
    next_generation: u64,
    cursor: Point,
    overlay_generation: Option<u64>,
}

impl<T: Clone + PartialEq> HoverScheduler<T> {
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            config,
            state: PreviewState::Idle,
            next_generation: 1,
            cursor: Point::default(),
            overlay_generation: None,
        }
    }

    pub fn state(&self) -> &PreviewState<T> {
        &self.state
    }

    /// Generation of the cycle that currently owns an overlay node, if any.
    pub fn overlay_generation(&self) -> Option<u64> {
        self.overlay_generation
    }

    pub fn handle<H: PreviewHost<T>>(&mut self, event: HoverEvent<T>, host: &H) -> Vec<Effect> {
        let mut effects = Vec::new();
        match event {
            HoverEvent::Enter { target, cursor } => {
                self.cursor = cursor;
                self.on_enter(target, host, &mut effects);
            }
            HoverEvent::Leave { target } => self.on_leave(&target, &mut effects),
            HoverEvent::Move { cursor } => {
                self.cursor = cursor;
                self.on_move(host, &mut effects);
            }
            HoverEvent::Scroll | HoverEvent::Dismiss => self.hide(&mut effects),
            HoverEvent::TimerFired { generation } => self.on_timer(generation, host, &mut effects),
            HoverEvent::DecodeLoaded {
                generation,
                intrinsic,
            } => self.on_decoded(generation, intrinsic, host, &mut effects),
            HoverEvent::DecodeFailed { generation } => {
                if self.is_loading(generation) {
                    self.hide(&mut effects);
                }
            }
            HoverEvent::HideElapsed { generation } => {
                self.on_hide_elapsed(generation, &mut effects)
            }
        }
        effects
    }

    fn on_enter<H: PreviewHost<T>>(&mut self, target: T, host: &H, effects: &mut Vec<Effect>) {
        if !host.enabled() {
            return;
        }
        if self.state.target() == Some(&target) {
            return;
        }
        // Cancels a pending timer or starts fading a preview of another element.
        self.hide(effects);
        let generation = self.bump_generation();
        self.state = PreviewState::Pending { target, generation };
        effects.push(Effect::StartTimer {
            generation,
            delay_ms: self.config.hover_delay_ms,
        });
    }

    fn on_leave(&mut self, target: &T, effects: &mut Vec<Effect>) {
        if self.state.target() != Some(target) {
            return;
        }
        self.hide(effects);
    }

    fn on_move<H: PreviewHost<T>>(&mut self, host: &H, effects: &mut Vec<Effect>) {
        let cursor = self.cursor;
        if let PreviewState::Visible {
            generation,
            intrinsic,
            geometry,
            ..
        } = &mut self.state
        {
            *geometry = compute_geometry(cursor, *intrinsic, host.viewport(), host.size_ratio());
            effects.push(Effect::Reposition {
                generation: *generation,
                geometry: *geometry,
            });
        }
    }

    fn on_timer<H: PreviewHost<T>>(
        &mut self,
        generation: u64,
        host: &H,
        effects: &mut Vec<Effect>,
    ) {
        let target = match &self.state {
            PreviewState::Pending {
                target,
                generation: pending,
            } if *pending == generation => target.clone(),
            _ => return,
        };
        if !host.enabled() {
            self.state = PreviewState::Idle;
            return;
        }
        let Some(url) = host.resolve(&target).filter(|url| passes_early_check(url)) else {
            self.state = PreviewState::Idle;
            return;
        };
        if let Some(previous) = self.overlay_generation.take() {
            effects.push(Effect::RemoveOverlay {
                generation: previous,
            });
        }
        self.overlay_generation = Some(generation);
        self.state = PreviewState::Loading {
            target,
            url: url.clone(),
            generation,
        };
        effects.push(Effect::LoadImage { generation, url });
    }

    fn on_decoded<H: PreviewHost<T>>(
        &mut self,
        generation: u64,
        intrinsic: Size,
        host: &H,
        effects: &mut Vec<Effect>,
    ) {
        let (target, url) = match &self.state {
            PreviewState::Loading {
                target,
                url,
                generation: loading,
            } if *loading == generation => (target.clone(), url.clone()),
            _ => return,
        };
        let already_full_size = host
            .display_size(&target)
            .map(|display| covers_intrinsic(display, intrinsic))
            .unwrap_or(false);
        if already_full_size {
            self.hide(effects);
            return;
        }
        let geometry = compute_geometry(self.cursor, intrinsic, host.viewport(), host.size_ratio());
        self.state = PreviewState::Visible {
            target,
            url,
            generation,
            intrinsic,
            geometry,
        };
        effects.push(Effect::Reveal {
            generation,
            geometry,
        });
    }

    fn on_hide_elapsed(&mut self, generation: u64, effects: &mut Vec<Effect>) {
        if self.overlay_generation == Some(generation) {
            self.overlay_generation = None;
            effects.push(Effect::RemoveOverlay { generation });
        }
        if matches!(self.state, PreviewState::Hiding { generation: live } if live == generation) {
            self.state = PreviewState::Idle;
        }
    }

    fn hide(&mut self, effects: &mut Vec<Effect>) {
        match std::mem::replace(&mut self.state, PreviewState::Idle) {
            PreviewState::Idle => {}
            PreviewState::Pending { .. } => effects.push(Effect::CancelTimer),
            PreviewState::Loading { generation, .. } | PreviewState::Visible { generation, .. } => {
                effects.push(Effect::FadeOut {
                    generation,
                    fade_ms: self.config.fade_ms,
                });
                self.state = PreviewState::Hiding { generation };
            }
            hiding @ PreviewState::Hiding { .. } => self.state = hiding,
        }
    }

    fn is_loading(&self, generation: u64) -> bool {
        matches!(
            self.state,
            PreviewState::Loading { generation: loading, .. } if loading == generation
        )
    }

    fn bump_generation(&mut self) -> u64 {
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        generation
    }
}
