use crate::errors::OrderError;
use crate::models::{sorted_entities, Entity, EntityKind, OrderLine};
use crate::services::cart::Cart;
use crate::services::validation::{check_fixed_temperatures, require_drinks};

use super::{add_line, describe_line, segment, subtract_line, ActionReply, Turn, FOLLOW_UP};

pub fn place_order(cart: &mut Cart, turn: &Turn, reply: &mut ActionReply) -> Result<(), OrderError> {
    let normalizer = cart.normalizer();
    let segmentation = segment(&normalizer, &turn.entities, Default::default());

    check_fixed_temperatures(&normalizer, &segmentation.lines)?;
    require_drinks(&segmentation.lines)?;

    for line in &segmentation.lines {
        add_line(cart, line);
    }

    reply.say(format!("주문하신 음료는 {}입니다. {FOLLOW_UP}", cart.summary()));
    Ok(())
}

/// Character span of the earliest contrast marker ("대신", "말고") in `text`.
fn contrast_span(text: &str, markers: &[String]) -> Option<(usize, usize)> {
    markers
        .iter()
        .filter(|m| !m.is_empty())
        .filter_map(|m| text.find(m.as_str()).map(|byte| (byte, m)))
        .min_by_key(|(byte, _)| *byte)
        .map(|(byte, marker)| {
            let start = text[..byte].chars().count();
            (start, start + marker.chars().count())
        })
}

fn entities_within(entities: &[Entity], start: usize, end: usize) -> Vec<Entity> {
    entities
        .iter()
        .filter(|e| e.within(start, end))
        .cloned()
        .collect()
}

/// "A 대신 B": removes what precedes the marker and adds what follows it. Without a
/// marker the utterance replaces the whole cart.
pub fn modify_order(cart: &mut Cart, turn: &Turn, reply: &mut ActionReply) -> Result<(), OrderError> {
    let normalizer = cart.normalizer();
    let all = segment(&normalizer, &turn.entities, Default::default());
    require_drinks(&all.lines)?;

    match contrast_span(&turn.text, normalizer.contrast_markers()) {
        Some((marker_start, marker_end)) => {
            let text_end = turn.text.chars().count();
            let targets = segment(
                &normalizer,
                &entities_within(&turn.entities, 0, marker_start),
                Default::default(),
            );
            let replacements = segment(
                &normalizer,
                &entities_within(&turn.entities, marker_end, text_end),
                Default::default(),
            );
            check_fixed_temperatures(&normalizer, &replacements.lines)?;

            for line in &targets.lines {
                subtract_line(cart, line)?;
            }
            for line in &replacements.lines {
                add_line(cart, line);
            }
        }
        None => {
            check_fixed_temperatures(&normalizer, &all.lines)?;
            cart.clear();
            for line in &all.lines {
                add_line(cart, line);
            }
        }
    }

    reply.say(format!(
        "주문이 수정되었습니다. 현재 주문은 {}입니다. {FOLLOW_UP}",
        cart.summary()
    ));
    Ok(())
}

/// Removes each mentioned line. A line that cannot be removed is reported and the rest
/// still go through.
pub fn subtract_from_order(
    cart: &mut Cart,
    turn: &Turn,
    reply: &mut ActionReply,
) -> Result<(), OrderError> {
    let normalizer = cart.normalizer();
    let segmentation = segment(&normalizer, &turn.entities, Default::default());
    require_drinks(&segmentation.lines)?;

    let mut removed = Vec::new();
    for line in &segmentation.lines {
        match subtract_line(cart, line) {
            Ok(()) => removed.push(describe_line(line)),
            Err(err) => {
                tracing::info!(drink = %line.drink, error = %err, "could not remove line");
                reply.messages.extend(err.user_messages());
            }
        }
    }

    if cart.is_empty() {
        reply.say("모든 음료가 주문에서 제거되었습니다.");
    } else if removed.is_empty() {
        reply.say(format!("현재 주문은 {}입니다. {FOLLOW_UP}", cart.summary()));
    } else {
        reply.say(format!(
            "{}이(가) 주문에서 제거되었습니다. 현재 주문은 {}입니다. {FOLLOW_UP}",
            removed.join(", "),
            cart.summary()
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Direction {
    Add,
    Subtract,
}

/// Splits the utterance at add/subtract markers. Each marker owns the entities before it;
/// entities after the last marker follow that marker's direction. "추가" right after an
/// option word belongs to the option, not to the order.
fn split_by_markers(entities: &[Entity]) -> Vec<(Direction, Vec<Entity>)> {
    let mut groups: Vec<(Direction, Vec<Entity>)> = Vec::new();
    let mut pending = Vec::new();

    for (i, entity) in entities.iter().enumerate() {
        let direction = match entity.kind {
            EntityKind::Add
                if i == 0 || entities[i - 1].kind != EntityKind::AdditionalOptions =>
            {
                Some(Direction::Add)
            }
            EntityKind::Subtract => Some(Direction::Subtract),
            _ => None,
        };
        match direction {
            Some(direction) => groups.push((direction, std::mem::take(&mut pending))),
            None => pending.push(entity.clone()),
        }
    }

    if !pending.is_empty() {
        if let Some(direction) = groups.last().map(|(d, _)| *d) {
            groups.push((direction, pending));
        }
    }
    groups
}

/// "라떼는 추가하고 아메리카노는 빼 주세요": all additions first, then the removals.
pub fn add_subtract(cart: &mut Cart, turn: &Turn, reply: &mut ActionReply) -> Result<(), OrderError> {
    let normalizer = cart.normalizer();
    let entities = sorted_entities(&turn.entities);

    let mut additions: Vec<OrderLine> = Vec::new();
    let mut removals: Vec<OrderLine> = Vec::new();
    for (direction, group) in split_by_markers(&entities) {
        let lines = segment(&normalizer, &group, Default::default()).lines;
        match direction {
            Direction::Add => additions.extend(lines),
            Direction::Subtract => removals.extend(lines),
        }
    }

    let all: Vec<OrderLine> = additions.iter().chain(removals.iter()).cloned().collect();
    check_fixed_temperatures(&normalizer, &all)?;
    require_drinks(&all)?;

    for line in &additions {
        add_line(cart, line);
    }
    for line in &removals {
        if let Err(err) = subtract_line(cart, line) {
            tracing::info!(drink = %line.drink, error = %err, "could not remove line");
            reply.messages.extend(err.user_messages());
        }
    }

    reply.say(format!(
        "주문이 수정되었습니다. 현재 주문은 {}입니다. {FOLLOW_UP}",
        cart.summary()
    ));
    Ok(())
}
