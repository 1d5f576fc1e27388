use std::collections::HashMap;

use image_hover_core::{
    Effect, HoverEvent, HoverScheduler, OverlayGeometry, Point, PreviewConfig, PreviewHost,
    PreviewState, Size,
};

struct FakePage {
    enabled: bool,
    ratio: f64,
    viewport: Size,
    sources: HashMap<u32, String>,
    display: HashMap<u32, Size>,
}

impl FakePage {
    fn new() -> Self {
        let mut sources = HashMap::new();
        sources.insert(1, "https://img.test/one.jpg".to_string());
        sources.insert(2, "https://img.test/two.jpg".to_string());
        sources.insert(3, "https://img.test/placeholder.png".to_string());
        Self {
            enabled: true,
            ratio: 0.8,
            viewport: Size::new(1000.0, 800.0),
            sources,
            display: HashMap::new(),
        }
    }
}

impl PreviewHost<u32> for FakePage {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn size_ratio(&self) -> f64 {
        self.ratio
    }

    fn viewport(&self) -> Size {
        self.viewport
    }

    fn resolve(&self, target: &u32) -> Option<String> {
        self.sources.get(target).cloned()
    }

    fn display_size(&self, target: &u32) -> Option<Size> {
        self.display.get(target).copied()
    }
}

fn config() -> PreviewConfig {
    PreviewConfig {
        hover_delay_ms: 150,
        fade_ms: 200,
    }
}

fn enter(target: u32) -> HoverEvent<u32> {
    HoverEvent::Enter {
        target,
        cursor: Point::new(100.0, 100.0),
    }
}

fn started_generation(effects: &[Effect]) -> u64 {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::StartTimer { generation, .. } => Some(*generation),
            _ => None,
        })
        .expect("timer started")
}

fn loaded_url(effects: &[Effect]) -> Option<&str> {
    effects.iter().find_map(|effect| match effect {
        Effect::LoadImage { url, .. } => Some(url.as_str()),
        _ => None,
    })
}

/// Drives target 1 all the way to a visible preview and returns its generation.
fn show(scheduler: &mut HoverScheduler<u32>, page: &FakePage) -> u64 {
    let generation = started_generation(&scheduler.handle(enter(1), page));
    scheduler.handle(HoverEvent::TimerFired { generation }, page);
    scheduler.handle(
        HoverEvent::DecodeLoaded {
            generation,
            intrinsic: Size::new(400.0, 300.0),
        },
        page,
    );
    assert!(matches!(scheduler.state(), PreviewState::Visible { .. }));
    generation
}

#[test]
fn full_cycle_reveals_then_removes_overlay() {
    let page = FakePage::new();
    let mut scheduler = HoverScheduler::new(config());

    let effects = scheduler.handle(enter(1), &page);
    assert_eq!(
        effects,
        vec![Effect::StartTimer {
            generation: 1,
            delay_ms: 150
        }]
    );

    let effects = scheduler.handle(HoverEvent::TimerFired { generation: 1 }, &page);
    assert_eq!(loaded_url(&effects), Some("https://img.test/one.jpg"));
    assert_eq!(scheduler.overlay_generation(), Some(1));

    let effects = scheduler.handle(
        HoverEvent::DecodeLoaded {
            generation: 1,
            intrinsic: Size::new(400.0, 300.0),
        },
        &page,
    );
    assert_eq!(
        effects,
        vec![Effect::Reveal {
            generation: 1,
            geometry: OverlayGeometry {
                left: 115.0,
                top: 115.0,
                width: 400.0,
                height: 300.0,
            },
        }]
    );

    let effects = scheduler.handle(
        HoverEvent::Move {
            cursor: Point::new(950.0, 750.0),
        },
        &page,
    );
    assert_eq!(
        effects,
        vec![Effect::Reposition {
            generation: 1,
            geometry: OverlayGeometry {
                left: 535.0,
                top: 435.0,
                width: 400.0,
                height: 300.0,
            },
        }]
    );

    let effects = scheduler.handle(HoverEvent::Leave { target: 1 }, &page);
    assert_eq!(
        effects,
        vec![Effect::FadeOut {
            generation: 1,
            fade_ms: 200
        }]
    );
    assert_eq!(scheduler.state(), &PreviewState::Hiding { generation: 1 });

    let effects = scheduler.handle(HoverEvent::HideElapsed { generation: 1 }, &page);
    assert_eq!(effects, vec![Effect::RemoveOverlay { generation: 1 }]);
    assert!(scheduler.state().is_idle());
    assert_eq!(scheduler.overlay_generation(), None);
}

#[test]
fn second_hover_cancels_first_pending_timer() {
    let page = FakePage::new();
    let mut scheduler = HoverScheduler::new(config());

    let first = started_generation(&scheduler.handle(enter(1), &page));
    let effects = scheduler.handle(enter(2), &page);
    assert_eq!(effects[0], Effect::CancelTimer);
    let second = started_generation(&effects);
    assert_ne!(first, second);

    // A late firing of the cancelled timer must not show element 1.
    let effects = scheduler.handle(HoverEvent::TimerFired { generation: first }, &page);
    assert!(effects.is_empty());
    assert!(matches!(scheduler.state(), PreviewState::Pending { target: 2, .. }));

    let effects = scheduler.handle(HoverEvent::TimerFired { generation: second }, &page);
    assert_eq!(loaded_url(&effects), Some("https://img.test/two.jpg"));
}

#[test]
fn repeated_enter_on_same_element_keeps_timer() {
    let page = FakePage::new();
    let mut scheduler = HoverScheduler::new(config());
    scheduler.handle(enter(1), &page);
    assert!(scheduler.handle(enter(1), &page).is_empty());
}

#[test]
fn leave_while_pending_returns_to_idle() {
    let page = FakePage::new();
    let mut scheduler = HoverScheduler::new(config());
    let generation = started_generation(&scheduler.handle(enter(1), &page));

    assert!(scheduler.handle(HoverEvent::Leave { target: 2 }, &page).is_empty());
    let effects = scheduler.handle(HoverEvent::Leave { target: 1 }, &page);
    assert_eq!(effects, vec![Effect::CancelTimer]);
    assert!(scheduler.state().is_idle());

    let effects = scheduler.handle(HoverEvent::TimerFired { generation }, &page);
    assert!(effects.is_empty());
}

#[test]
fn scroll_returns_every_state_to_idle() {
    let page = FakePage::new();

    // Pending
    let mut scheduler = HoverScheduler::new(config());
    scheduler.handle(enter(1), &page);
    assert_eq!(scheduler.handle(HoverEvent::Scroll, &page), vec![Effect::CancelTimer]);
    assert!(scheduler.state().is_idle());

    // Loading
    let mut scheduler = HoverScheduler::new(config());
    let generation = started_generation(&scheduler.handle(enter(1), &page));
    scheduler.handle(HoverEvent::TimerFired { generation }, &page);
    scheduler.handle(HoverEvent::Scroll, &page);
    scheduler.handle(HoverEvent::HideElapsed { generation }, &page);
    assert!(scheduler.state().is_idle());
    assert_eq!(scheduler.overlay_generation(), None);

    // Visible
    let mut scheduler = HoverScheduler::new(config());
    let generation = show(&mut scheduler, &page);
    let effects = scheduler.handle(HoverEvent::Scroll, &page);
    assert!(matches!(effects[..], [Effect::FadeOut { .. }]));
    let effects = scheduler.handle(HoverEvent::HideElapsed { generation }, &page);
    assert_eq!(effects, vec![Effect::RemoveOverlay { generation }]);
    assert!(scheduler.state().is_idle());

    // Idle
    assert!(scheduler.handle(HoverEvent::Scroll, &page).is_empty());
}

#[test]
fn disabling_hides_and_enabling_does_not_resurrect() {
    let mut page = FakePage::new();
    let mut scheduler = HoverScheduler::new(config());
    let generation = show(&mut scheduler, &page);

    page.enabled = false;
    let effects = scheduler.handle(HoverEvent::Dismiss, &page);
    assert!(matches!(effects[..], [Effect::FadeOut { .. }]));
    scheduler.handle(HoverEvent::HideElapsed { generation }, &page);
    assert!(scheduler.handle(enter(2), &page).is_empty());

    page.enabled = true;
    assert!(scheduler.state().is_idle());
    let wiggle = HoverEvent::Move {
        cursor: Point::new(5.0, 5.0),
    };
    assert!(scheduler.handle(wiggle, &page).is_empty());
    assert!(scheduler.state().is_idle());

    scheduler.handle(enter(2), &page);
    assert!(matches!(scheduler.state(), PreviewState::Pending { target: 2, .. }));
}

#[test]
fn disabled_while_pending_does_not_load() {
    let mut page = FakePage::new();
    let mut scheduler = HoverScheduler::new(config());
    let generation = started_generation(&scheduler.handle(enter(1), &page));
    page.enabled = false;
    let effects = scheduler.handle(HoverEvent::TimerFired { generation }, &page);
    assert!(effects.is_empty());
    assert!(scheduler.state().is_idle());
}

#[test]
fn placeholder_source_stays_idle() {
    let page = FakePage::new();
    let mut scheduler = HoverScheduler::new(config());
    let generation = started_generation(&scheduler.handle(enter(3), &page));
    let effects = scheduler.handle(HoverEvent::TimerFired { generation }, &page);
    assert!(effects.is_empty());
    assert!(scheduler.state().is_idle());
}

#[test]
fn unresolvable_source_stays_idle() {
    let page = FakePage::new();
    let mut scheduler = HoverScheduler::new(config());
    let generation = started_generation(&scheduler.handle(enter(42), &page));
    assert!(scheduler
        .handle(HoverEvent::TimerFired { generation }, &page)
        .is_empty());
    assert!(scheduler.state().is_idle());
}

#[test]
fn decode_failure_hides() {
    let page = FakePage::new();
    let mut scheduler = HoverScheduler::new(config());
    let generation = started_generation(&scheduler.handle(enter(1), &page));
    scheduler.handle(HoverEvent::TimerFired { generation }, &page);
    let effects = scheduler.handle(HoverEvent::DecodeFailed { generation }, &page);
    assert_eq!(
        effects,
        vec![Effect::FadeOut {
            generation,
            fade_ms: 200
        }]
    );
}

#[test]
fn full_size_element_is_suppressed_after_decode() {
    let mut page = FakePage::new();
    page.display.insert(1, Size::new(380.0, 290.0));
    let mut scheduler = HoverScheduler::new(config());
    let generation = started_generation(&scheduler.handle(enter(1), &page));
    scheduler.handle(HoverEvent::TimerFired { generation }, &page);
    let effects = scheduler.handle(
        HoverEvent::DecodeLoaded {
            generation,
            intrinsic: Size::new(400.0, 300.0),
        },
        &page,
    );
    assert!(matches!(effects[..], [Effect::FadeOut { .. }]));
    assert!(!effects.iter().any(|effect| matches!(effect, Effect::Reveal { .. })));
}

#[test]
fn stale_decode_is_ignored() {
    let page = FakePage::new();
    let mut scheduler = HoverScheduler::new(config());
    let first = started_generation(&scheduler.handle(enter(1), &page));
    scheduler.handle(HoverEvent::TimerFired { generation: first }, &page);

    // Pointer moves on to element 2 before element 1's image decodes.
    let effects = scheduler.handle(enter(2), &page);
    assert!(matches!(effects[0], Effect::FadeOut { generation, .. } if generation == first));

    let effects = scheduler.handle(
        HoverEvent::DecodeLoaded {
            generation: first,
            intrinsic: Size::new(400.0, 300.0),
        },
        &page,
    );
    assert!(effects.is_empty());
    assert!(matches!(scheduler.state(), PreviewState::Pending { target: 2, .. }));
}

#[test]
fn new_load_during_fade_replaces_old_overlay() {
    let page = FakePage::new();
    let mut scheduler = HoverScheduler::new(config());
    let first = show(&mut scheduler, &page);
    scheduler.handle(HoverEvent::Leave { target: 1 }, &page);

    let second = started_generation(&scheduler.handle(enter(2), &page));
    let effects = scheduler.handle(HoverEvent::TimerFired { generation: second }, &page);
    assert_eq!(effects[0], Effect::RemoveOverlay { generation: first });
    assert_eq!(loaded_url(&effects), Some("https://img.test/two.jpg"));

    // The old fade completing later must not touch the new overlay.
    let effects = scheduler.handle(HoverEvent::HideElapsed { generation: first }, &page);
    assert!(effects.is_empty());
    assert_eq!(scheduler.overlay_generation(), Some(second));
    assert!(matches!(scheduler.state(), PreviewState::Loading { target: 2, .. }));
}

#[test]
fn size_ratio_change_applies_on_next_reveal() {
    let mut page = FakePage::new();
    let mut scheduler = HoverScheduler::new(config());
    let generation = show(&mut scheduler, &page);
    scheduler.handle(HoverEvent::Dismiss, &page);
    scheduler.handle(HoverEvent::HideElapsed { generation }, &page);

    page.ratio = 0.2;
    let generation = started_generation(&scheduler.handle(enter(1), &page));
    scheduler.handle(HoverEvent::TimerFired { generation }, &page);
    let effects = scheduler.handle(
        HoverEvent::DecodeLoaded {
            generation,
            intrinsic: Size::new(400.0, 300.0),
        },
        &page,
    );
    let Effect::Reveal { geometry, .. } = &effects[0] else {
        panic!("expected reveal, got {effects:?}");
    };
    assert_eq!(geometry.width, 200.0);
    assert_eq!(geometry.height, 160.0);
}
