//! Headless demo of the transition engine.
//!
//! Drives a few elements through fades, a color change, a reversal and an
//! element removal on a manual clock, logging every lifecycle event.
//!
//! Run with: RUST_LOG=info cargo run

use anyhow::Result;
use rune_config::RuneConfig;
use rune_transition::{
    Color, EasingFunction, ElementArena, ElementId, ElementStyle, EventContext, EventSink, Length,
    ManualClock, StylePropertyId, StyleValue, TransitionDispatcher, TransitionEvent,
    TransitionEventKind, TransitionGroup, TransitionSpec,
};

/// Logs events and bounces the card's opacity back whenever a fade ends.
struct DemoSink {
    card: ElementId,
    transitions: TransitionGroup,
    received: usize,
}

impl EventSink for DemoSink {
    fn send(&mut self, event: &TransitionEvent, cx: &mut EventContext<'_>) {
        self.received += 1;
        log::info!(
            "{:?} {:?} on {:?} after {:.3}s",
            event.kind(),
            event.property(),
            event.target(),
            event.elapsed_time()
        );

        if event.kind() == TransitionEventKind::End
            && event.target() == self.card
            && event.property() == StylePropertyId::Opacity
        {
            if let Some(spec) = self.transitions.spec_for(StylePropertyId::Opacity) {
                cx.transitions.start_transition(
                    self.card,
                    StylePropertyId::Opacity,
                    1.0_f32.into(),
                    0.2_f32.into(),
                    spec,
                );
            }
        }
    }
}

/// Starts a transition the way a style cascade would: animate when the
/// element declares one for `property`, otherwise apply the new value.
fn change_style(
    transitions: &mut TransitionDispatcher,
    elements: &mut ElementArena,
    group: &TransitionGroup,
    id: ElementId,
    property: StylePropertyId,
    end: StyleValue,
) {
    let Some(start) = elements.value(id, property) else {
        return;
    };
    let animating = group
        .spec_for(property)
        .is_some_and(|spec| transitions.start_transition(id, property, start, end, spec));
    if !animating {
        if let Some(style) = elements.get_mut(id) {
            style.set(property, end);
        }
    }
}

fn main() -> Result<()> {
    let _ = env_logger::try_init();

    let config = RuneConfig::load();
    let clock = ManualClock::new();
    let mut transitions =
        TransitionDispatcher::with_config(&config.transitions, Box::new(clock.clone()));
    let mut elements = ElementArena::new();

    let group = TransitionGroup::new()
        .with(TransitionSpec::new(300).with_easing(EasingFunction::EaseInOut))
        .with(
            TransitionSpec::property(StylePropertyId::Width, 500)
                .with_delay(-100)
                .with_easing(EasingFunction::CubicOut),
        );

    let card = elements.insert(
        ElementStyle::new()
            .with_value(StylePropertyId::Opacity, 0.0_f32)
            .with_value(StylePropertyId::Width, Length::px(120.0))
            .with_value(StylePropertyId::BackgroundColor, Color::WHITE),
    );
    let toast = elements.insert(ElementStyle::new().with_value(StylePropertyId::Opacity, 1.0_f32));

    let mut sink = DemoSink {
        card,
        transitions: group.clone(),
        received: 0,
    };

    change_style(
        &mut transitions,
        &mut elements,
        &group,
        card,
        StylePropertyId::Opacity,
        1.0_f32.into(),
    );
    change_style(
        &mut transitions,
        &mut elements,
        &group,
        card,
        StylePropertyId::Width,
        Length::px(240.0).into(),
    );
    change_style(
        &mut transitions,
        &mut elements,
        &group,
        card,
        StylePropertyId::BackgroundColor,
        Color::rgba(0.1, 0.4, 0.9, 1.0).into(),
    );
    change_style(
        &mut transitions,
        &mut elements,
        &group,
        toast,
        StylePropertyId::Opacity,
        0.0_f32.into(),
    );

    for frame in 0..config.demo.frames {
        clock.set_ms(i64::from(frame) * config.demo.frame_interval_ms);
        transitions.update(&mut elements, &mut sink);

        match frame {
            // Hovered away half-way through: the width reverses.
            10 => change_style(
                &mut transitions,
                &mut elements,
                &group,
                card,
                StylePropertyId::Width,
                Length::px(120.0).into(),
            ),
            // The toast leaves the tree while still fading.
            12 => {
                transitions.cancel_all_animations_for(toast, &mut elements);
                elements.remove(toast);
            }
            // The card moves to another panel.
            60 => transitions.cancel_all_animations_immediate(card, &mut elements, &mut sink),
            _ => {}
        }

        let dirty = elements.get_mut(card).map(|style| style.take_dirty());
        log::debug!(
            "frame {frame}: {} running, card dirty {dirty:?}",
            transitions.running_count()
        );
    }

    transitions.check_invariants()?;
    log::info!(
        "Delivered {} events; card opacity {:?}, width {:?}",
        sink.received,
        elements.value(card, StylePropertyId::Opacity),
        elements.value(card, StylePropertyId::Width)
    );
    Ok(())
}
