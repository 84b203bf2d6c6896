mod common;

use common::{approx, layout_line, layout_spans, link, with_links};
use vizij_text_effects::{
    AnimationType, ColorEffect, Curve, CurveFollowEffect, Effect, EffectKind, EffectScope,
    EffectTiming, FadeEffect, FrameStatus, GlobalEffectEntry, ManualClock, MoveEffect,
    RotateEffect, RotatePivot, Rgba8, ScaleEffect, SchedulerConfig, TagEffectEntry,
    TagEffectsPreset, TextEffectConfig, TextEffectEvent, TextEffectScheduler, TextInfo,
    TriggerWhen, ALL_VERTICES,
};

const RED: Rgba8 = [255, 0, 0, 255];
const GREEN: Rgba8 = [0, 255, 0, 255];
const BLUE: Rgba8 = [0, 0, 255, 255];

fn scheduler(config: TextEffectConfig) -> (TextEffectScheduler, ManualClock) {
    let clock = ManualClock::new(0.0);
    (
        TextEffectScheduler::new(config, Box::new(clock.clone())),
        clock,
    )
}

fn linear_timing() -> EffectTiming {
    EffectTiming {
        duration_per_char: 1.0,
        delay_per_char: 0.0,
        easing_curve: Curve::linear(0.0, 0.0, 1.0, 1.0),
        ..Default::default()
    }
}

fn solid(tag: &str, color: Rgba8) -> Effect {
    Effect::new(
        tag,
        EffectKind::Color(ColorEffect {
            start_color: color,
            end_color: color,
        }),
    )
}

fn shift(tag: &str, dy: f32) -> Effect {
    Effect::new(
        tag,
        EffectKind::Move(MoveEffect {
            start_offset: [0.0, dy, 0.0],
            end_offset: [0.0, dy, 0.0],
        }),
    )
}

fn char_color(text: &TextInfo, i: usize) -> Rgba8 {
    let info = &text.characters[i];
    text.meshes[info.material_index].colors[info.vertex_index]
}

fn layered_config() -> TextEffectConfig {
    TextEffectConfig {
        global_effects: vec![
            GlobalEffectEntry::new(
                Effect::new("grow", EffectKind::Scale(ScaleEffect::default()))
                    .with_timing(linear_timing()),
                TriggerWhen::OnStart,
            ),
            GlobalEffectEntry::new(
                Effect::new(
                    "spin",
                    EffectKind::Rotate(RotateEffect {
                        start_angle: 0.0,
                        end_angle: 45.0,
                        pivot: RotatePivot::Baseline,
                    }),
                )
                .with_timing(linear_timing()),
                TriggerWhen::OnStart,
            )
            .overriding(),
        ],
        tag_effects: vec![TagEffectEntry::new(
            Effect::new(
                "rise",
                EffectKind::Move(MoveEffect {
                    start_offset: [0.0, -3.0, 0.0],
                    end_offset: [1.0, 0.0, 0.0],
                }),
            )
            .with_timing(linear_timing()),
            TriggerWhen::OnStart,
        )],
        ..Default::default()
    }
}

#[test]
fn composition_is_deterministic_and_ordered() {
    let layout = with_links(layout_line("hello", 2.0), vec![link("rise", 1, 3)]);

    let run = || {
        let (mut sched, clock) = scheduler(layered_config());
        let mut text = layout.clone();
        sched.rebuild(&mut text);
        clock.set(0.3);
        let mut text = layout.clone();
        let out = sched.tick(&mut text);
        assert_eq!(out.status, FrameStatus::Applied);
        text
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);

    // Same result as applying global non-override, tag, then global override by hand.
    let cfg = layered_config();
    let instance = |entry: &GlobalEffectEntry| {
        let mut inst = entry
            .effect
            .as_ref()
            .expect("effect")
            .instantiate(0, layout.character_count());
        inst.start(0.0);
        inst
    };
    let mut grow = instance(&cfg.global_effects[0]);
    let mut spin = instance(&cfg.global_effects[1]);
    let mut rise = cfg.tag_effects[0]
        .effect
        .as_ref()
        .expect("effect")
        .instantiate(1, 3);
    rise.start(0.0);
    let mut manual = layout.clone();
    for i in 0..manual.character_count() {
        grow.apply(&mut manual, i, ALL_VERTICES, 0.3);
        rise.apply(&mut manual, i, ALL_VERTICES, 0.3);
        spin.apply(&mut manual, i, ALL_VERTICES, 0.3);
    }
    assert_eq!(first.meshes, manual.meshes);
}

#[test]
fn override_globals_win_over_tag_effects() {
    let layout = with_links(layout_spans(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0)], 1.0), vec![link("green", 0, 2)]);
    let mut config = TextEffectConfig {
        global_effects: vec![GlobalEffectEntry::new(solid("red", RED), TriggerWhen::OnStart)],
        tag_effects: vec![TagEffectEntry::new(solid("green", GREEN), TriggerWhen::OnStart)],
        ..Default::default()
    };

    let (mut sched, _clock) = scheduler(config.clone());
    let mut text = layout.clone();
    sched.rebuild(&mut text);
    let mut text = layout.clone();
    sched.tick(&mut text);
    assert_eq!(char_color(&text, 0), GREEN);
    assert_eq!(char_color(&text, 1), GREEN);
    assert_eq!(char_color(&text, 2), RED);

    config
        .global_effects
        .push(GlobalEffectEntry::new(solid("blue", BLUE), TriggerWhen::OnStart).overriding());
    let (mut sched, _clock) = scheduler(config);
    let mut text = layout.clone();
    sched.rebuild(&mut text);
    let mut text = layout.clone();
    sched.tick(&mut text);
    for i in 0..3 {
        assert_eq!(char_color(&text, i), BLUE);
    }
}

#[test]
fn ambiguous_tag_uses_first_template_and_warns() {
    let config = TextEffectConfig {
        tag_effects: vec![
            TagEffectEntry::new(shift("Bounce", -4.0), TriggerWhen::OnStart),
            TagEffectEntry::new(shift("Bounce", -40.0), TriggerWhen::OnStart),
        ],
        ..Default::default()
    };
    let layout = with_links(layout_spans(&[(0.0, 1.0), (1.0, 2.0)], 1.0), vec![link("Bounce", 0, 1)]);
    let (mut sched, _clock) = scheduler(config);
    let mut text = layout.clone();
    let report = sched.rebuild(&mut text);

    assert_eq!(
        report.events,
        vec![TextEffectEvent::AmbiguousEffect {
            name: "Bounce".into(),
            matches: 2
        }]
    );
    assert_eq!(sched.buckets(EffectScope::Tag).len(), 1);

    let mut text = layout.clone();
    sched.tick(&mut text);
    let moved = text.quad(0).expect("quad");
    let before = layout.quad(0).expect("quad");
    approx(moved[0][1] - before[0][1], -4.0, 1e-6);
    assert_eq!(text.quad(1), layout.quad(1));
}

#[test]
fn combined_annotation_resolves_each_name() {
    let config = TextEffectConfig {
        tag_effects: vec![
            TagEffectEntry::new(shift("up", 2.0), TriggerWhen::OnStart),
            TagEffectEntry::new(solid("red", RED), TriggerWhen::Manual),
            TagEffectEntry::default(),
        ],
        ..Default::default()
    };
    let layout = with_links(
        layout_line("abcd", 1.0),
        vec![link("up+missing+red", 1, 2), link("", 0, 4)],
    );
    let (mut sched, _clock) = scheduler(config);
    let mut text = layout.clone();
    let report = sched.rebuild(&mut text);

    assert_eq!(
        report.events,
        vec![TextEffectEvent::EffectNotFound {
            name: "missing".into()
        }]
    );
    let tags = sched.buckets(EffectScope::Tag);
    assert_eq!(tags.on_start.len(), 1);
    assert_eq!(tags.manual.len(), 1);
    assert_eq!(tags.on_start[0].instance.playback().start_char_index, 1);
    assert_eq!(tags.on_start[0].instance.playback().char_length, 2);
}

#[test]
fn layout_effects_are_coerced_without_touching_templates() {
    let config = TextEffectConfig {
        global_effects: vec![
            GlobalEffectEntry::new(
                Effect::new("wave", EffectKind::CurveFollow(CurveFollowEffect::default())),
                TriggerWhen::Manual,
            ),
            GlobalEffectEntry::new(
                Effect::new("grow", EffectKind::Scale(ScaleEffect::default())),
                TriggerWhen::OnAwake,
            ),
        ],
        tag_effects: vec![TagEffectEntry::new(
            Effect::new("arc", EffectKind::CurveFollow(CurveFollowEffect::default())),
            TriggerWhen::OnStart,
        )],
        ..Default::default()
    };
    let layout = with_links(layout_line("curve", 2.0), vec![link("arc", 0, 5)]);
    let (mut sched, _clock) = scheduler(config);
    let mut text = layout.clone();
    let report = sched.rebuild(&mut text);

    assert!(report.awake_applied);
    assert_ne!(text.meshes, layout.meshes);
    let global = sched.buckets(EffectScope::Global);
    assert_eq!(global.on_awake.len(), 1);
    assert_eq!(global.on_awake[0].tag(), "wave");
    assert_eq!(global.on_start.len(), 1);
    assert_eq!(global.on_start[0].tag(), "grow");
    assert!(global.manual.is_empty());
    assert_eq!(sched.buckets(EffectScope::Tag).on_awake.len(), 1);

    assert_eq!(sched.config().global_effects[0].trigger_when, TriggerWhen::Manual);
    assert_eq!(sched.config().global_effects[1].trigger_when, TriggerWhen::OnAwake);
    assert_eq!(sched.config().tag_effects[0].trigger_when, TriggerWhen::OnStart);
}

#[test]
fn layout_effects_reapply_identically_every_tick() {
    let config = TextEffectConfig {
        global_effects: vec![GlobalEffectEntry::new(
            Effect::new("wave", EffectKind::CurveFollow(CurveFollowEffect::default())),
            TriggerWhen::OnAwake,
        )],
        ..Default::default()
    };
    let layout = layout_line("wavy text", 2.0);
    let (mut sched, clock) = scheduler(config);
    let mut rebuilt = layout.clone();
    sched.rebuild(&mut rebuilt);

    for step in 1..4 {
        clock.set(step as f64);
        let mut text = layout.clone();
        assert!(sched.tick(&mut text).applied());
        assert_eq!(text.meshes, rebuilt.meshes);
    }
}

fn lift_along(tag: &str, height: f32) -> Effect {
    Effect::new(
        tag,
        EffectKind::CurveFollow(CurveFollowEffect {
            curve: Curve::constant(height),
            amplitude: 1.0,
            apply_rotation: false,
        }),
    )
}

#[test]
fn stacked_layout_effects_read_untouched_geometry() {
    let config = TextEffectConfig {
        global_effects: vec![GlobalEffectEntry::new(
            lift_along("raise", 10.0),
            TriggerWhen::OnAwake,
        )],
        tag_effects: vec![TagEffectEntry::new(
            lift_along("arc", 5.0),
            TriggerWhen::OnAwake,
        )],
        ..Default::default()
    };
    let layout = with_links(layout_line("abcd", 1.0), vec![link("arc", 1, 3)]);
    let (mut sched, clock) = scheduler(config);
    let mut text = layout.clone();
    assert!(sched.rebuild(&mut text).awake_applied);

    // The tag warp replaces the global one inside its span.
    let baseline = |text: &TextInfo| -> Vec<f32> {
        (0..4).map(|i| text.quad(i).expect("quad")[0][1]).collect()
    };
    for (i, y) in baseline(&text).into_iter().enumerate() {
        approx(y, if i == 0 { 10.0 } else { 5.0 }, 1e-5);
    }

    clock.set(1.0);
    let mut ticked = layout.clone();
    assert!(sched.tick(&mut ticked).applied());
    assert_eq!(baseline(&ticked), baseline(&text));
}

#[test]
fn no_layout_effects_reports_nothing_applied() {
    let (mut sched, _clock) = scheduler(layered_config());
    let layout = layout_line("plain", 1.0);
    let mut text = layout.clone();
    let report = sched.rebuild(&mut text);
    assert!(!report.awake_applied);
    assert_eq!(text, layout);
    assert!(!sched.is_dirty());
}

#[test]
fn ticks_are_rate_limited() {
    let config = TextEffectConfig {
        global_effects: vec![GlobalEffectEntry::new(solid("red", RED), TriggerWhen::OnStart)],
        scheduler: SchedulerConfig {
            updates_per_second: 10,
        },
        ..Default::default()
    };
    let layout = layout_line("rate", 1.0);
    let (mut sched, clock) = scheduler(config);
    sched.rebuild(&mut layout.clone());

    let mut text = layout.clone();
    assert_eq!(sched.tick(&mut text).status, FrameStatus::Applied);

    clock.set(0.05);
    let mut text = layout.clone();
    assert!(!sched.is_due());
    assert_eq!(sched.tick(&mut text).status, FrameStatus::Skipped);
    assert_eq!(text, layout, "skipped frames do no work");

    clock.set(0.1);
    assert_eq!(sched.tick(&mut layout.clone()).status, FrameStatus::Applied);

    // Restarting lets the next tick through immediately.
    clock.set(0.12);
    sched.start_on_start_effects();
    assert_eq!(sched.tick(&mut layout.clone()).status, FrameStatus::Applied);
}

#[test]
fn rate_change_applies_on_the_next_tick() {
    let config = TextEffectConfig {
        global_effects: vec![GlobalEffectEntry::new(solid("red", RED), TriggerWhen::OnStart)],
        scheduler: SchedulerConfig {
            updates_per_second: 1,
        },
        ..Default::default()
    };
    let layout = layout_line("rate", 1.0);
    let (mut sched, clock) = scheduler(config);
    sched.rebuild(&mut layout.clone());
    assert_eq!(sched.tick(&mut layout.clone()).status, FrameStatus::Applied);

    clock.set(0.05);
    assert_eq!(sched.tick(&mut layout.clone()).status, FrameStatus::Skipped);

    sched.set_scheduler_config(SchedulerConfig {
        updates_per_second: 120,
    });
    clock.set(0.06);
    assert!(sched.is_due());
    assert_eq!(sched.tick(&mut layout.clone()).status, FrameStatus::Applied);

    clock.set(0.065);
    assert_eq!(sched.tick(&mut layout.clone()).status, FrameStatus::Skipped);
}

#[test]
fn completion_is_reported_once_per_run() {
    let timing = EffectTiming {
        duration_per_char: 0.5,
        delay_per_char: 0.1,
        ..Default::default()
    };
    let config = TextEffectConfig {
        global_effects: vec![GlobalEffectEntry::new(
            Effect::new("fade", EffectKind::Fade(FadeEffect::default())).with_timing(timing),
            TriggerWhen::OnStart,
        )],
        ..Default::default()
    };
    let layout = layout_line("abc", 1.0);
    let (mut sched, clock) = scheduler(config);
    sched.rebuild(&mut layout.clone());

    clock.set(0.2);
    assert!(sched.tick(&mut layout.clone()).events.is_empty());

    clock.set(1.0);
    let events = sched.tick(&mut layout.clone()).events;
    assert_eq!(events.len(), 1);
    assert!(matches!(
        &events[0],
        TextEffectEvent::EffectCompleted { tag, scope: EffectScope::Global, trigger: TriggerWhen::OnStart, .. } if tag == "fade"
    ));

    clock.set(2.0);
    assert!(sched.tick(&mut layout.clone()).events.is_empty());

    sched.start_on_start_effects();
    clock.set(3.0);
    assert_eq!(sched.tick(&mut layout.clone()).events.len(), 1);
}

#[test]
fn fixed_duration_loops_are_rearmed_by_tick() {
    let timing = EffectTiming {
        animation_type: AnimationType::LoopFixedDuration,
        duration_per_char: 0.4,
        delay_per_char: 0.0,
        fixed_duration: 1.0,
        easing_curve: Curve::linear(0.0, 0.0, 1.0, 1.0),
        ..Default::default()
    };
    let config = TextEffectConfig {
        global_effects: vec![GlobalEffectEntry::new(
            Effect::new("pulse", EffectKind::Scale(ScaleEffect::default())).with_timing(timing),
            TriggerWhen::OnStart,
        )],
        ..Default::default()
    };
    let layout = layout_spans(&[(0.0, 2.0)], 2.0);
    let (mut sched, clock) = scheduler(config);
    sched.rebuild(&mut layout.clone());

    clock.set(1.2);
    let mut text = layout.clone();
    sched.tick(&mut text);
    let entry = &sched.buckets(EffectScope::Global).on_start[0];
    approx(entry.instance.playback().start_time as f32, 1.0, 1e-9);
    // Half way through the second cycle: corners pulled half way to the centroid.
    let q = text.quad(0).expect("quad");
    approx(q[0][0], 0.5, 1e-4);
    approx(q[2][0], 1.5, 1e-4);
}

#[test]
fn stopped_effects_leave_geometry_alone() {
    let (mut sched, clock) = scheduler(layered_config());
    let layout = with_links(layout_line("still", 1.0), vec![link("rise", 0, 5)]);
    sched.rebuild(&mut layout.clone());
    sched.stop_on_start_effects();
    clock.set(0.5);
    let mut text = layout.clone();
    assert!(sched.tick(&mut text).applied());
    assert_eq!(text, layout);

    sched.start_on_start_effects();
    sched.stop_all_effects();
    clock.set(0.6);
    let mut text = layout.clone();
    sched.tick(&mut text);
    assert_eq!(text, layout);
}

#[test]
fn manual_effects_start_and_stop_on_request() {
    let config = TextEffectConfig {
        global_effects: vec![GlobalEffectEntry::new(solid("Highlight", RED), TriggerWhen::Manual)],
        tag_effects: vec![TagEffectEntry::new(solid("blink", GREEN), TriggerWhen::Manual)],
        ..Default::default()
    };
    let layout = with_links(layout_line("hey", 1.0), vec![link("blink", 2, 1)]);
    let (mut sched, _clock) = scheduler(config);
    sched.rebuild(&mut layout.clone());

    let statuses = sched.query_effect_statuses(EffectScope::Global, TriggerWhen::Manual);
    assert_eq!(statuses.len(), 1);
    assert!(!statuses[0].started);
    assert!(sched.find_manual_effect("Highlight").is_some());
    assert!(sched.find_manual_effect("blink").is_none());

    assert!(sched.start_manual_effect("Highlight"));
    assert!(sched.query_effect_statuses_by_tag(EffectScope::Global, TriggerWhen::Manual, "Highlight")[0].started);

    assert!(!sched.start_manual_effect("nope"));
    assert_eq!(
        sched.take_events(),
        vec![TextEffectEvent::ManualEffectNotFound {
            name: "nope".into(),
            scope: EffectScope::Global,
            available: vec!["Highlight".into()],
        }]
    );

    assert!(sched.start_manual_tag_effect("blink"));
    let mut text = layout.clone();
    sched.tick(&mut text);
    assert_eq!(char_color(&text, 0), RED);
    assert_eq!(char_color(&text, 2), GREEN);

    sched.stop_manual_tag_effects();
    assert!(!sched.query_effect_statuses(EffectScope::Tag, TriggerWhen::Manual)[0].started);
    sched.stop_manual_effects();
    assert!(!sched.query_effect_statuses(EffectScope::Global, TriggerWhen::Manual)[0].started);

    sched.start_manual_effects();
    sched.start_manual_tag_effects();
    assert!(sched.query_effect_statuses(EffectScope::Tag, TriggerWhen::Manual)[0].started);
    sched.stop_all_effects();
    assert!(!sched.query_effect_statuses(EffectScope::Global, TriggerWhen::Manual)[0].started);
}

#[test]
fn missed_manual_start_is_delivered_with_next_frame() {
    let (mut sched, _clock) = scheduler(TextEffectConfig::default());
    let layout = layout_line("x", 1.0);
    sched.rebuild(&mut layout.clone());
    assert!(!sched.start_manual_tag_effect("ghost"));
    let out = sched.tick(&mut layout.clone());
    assert!(matches!(
        out.events.as_slice(),
        [TextEffectEvent::ManualEffectNotFound { name, scope: EffectScope::Tag, .. }] if name == "ghost"
    ));
}

#[test]
fn preset_tags_resolve_only_when_enabled() {
    let preset = TagEffectsPreset {
        name: "emphasis".into(),
        tag_effects: vec![TagEffectEntry::new(shift("grow", 1.0), TriggerWhen::OnStart)],
    };
    let layout = with_links(layout_line("big", 1.0), vec![link("grow", 0, 3)]);
    let (mut sched, _clock) = scheduler(TextEffectConfig {
        preset: Some(preset.clone()),
        use_preset: false,
        ..Default::default()
    });
    let report = sched.rebuild(&mut layout.clone());
    assert!(matches!(
        report.events.as_slice(),
        [TextEffectEvent::EffectNotFound { name }] if name == "grow"
    ));

    sched.set_preset(Some(preset), true);
    assert!(sched.is_dirty());
    let report = sched.rebuild(&mut layout.clone());
    assert!(report.events.is_empty());
    assert_eq!(sched.buckets(EffectScope::Tag).on_start.len(), 1);
    assert!(!sched.is_dirty());
}

#[test]
fn rebuild_replaces_previous_entries() {
    let (mut sched, _clock) = scheduler(layered_config());
    let layout = with_links(layout_line("again", 1.0), vec![link("rise", 0, 2)]);
    sched.rebuild(&mut layout.clone());
    let first_ids: Vec<_> = sched.buckets(EffectScope::Global).on_start.iter().map(|e| e.id).collect();
    sched.rebuild(&mut layout.clone());
    let second_ids: Vec<_> = sched.buckets(EffectScope::Global).on_start.iter().map(|e| e.id).collect();
    assert_eq!(first_ids.len(), second_ids.len());
    assert!(first_ids.iter().all(|id| !second_ids.contains(id)));

    sched.set_global_effects(Vec::new());
    sched.rebuild(&mut layout.clone());
    assert!(sched.buckets(EffectScope::Global).is_empty());
    assert_eq!(sched.buckets(EffectScope::Tag).len(), 1);
}
