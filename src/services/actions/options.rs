use crate::errors::OrderError;
use crate::models::{sorted_entities, EntityKind, OptionSet};
use crate::services::cart::Cart;
use crate::services::validation::{check_fixed_temperatures, require_drinks};

use super::{add_line, segment, ActionReply, Turn, FOLLOW_UP};

/// With one "추가" every mentioned option is merged into matching plain cups, or new cups
/// are ordered. With two or more, the options between the last two markers are the new
/// ones and the rest of each line's options pick the cups to patch:
/// "샷 추가한 아메리카노에 바닐라시럽 추가".
pub fn add_option(cart: &mut Cart, turn: &Turn, reply: &mut ActionReply) -> Result<(), OrderError> {
    let normalizer = cart.normalizer();
    let entities = sorted_entities(&turn.entities);
    let markers: Vec<usize> = entities
        .iter()
        .enumerate()
        .filter(|(_, e)| e.kind == EntityKind::Add)
        .map(|(i, _)| i)
        .collect();

    if let [.., previous, last] = markers[..] {
        let new_options = OptionSet::from_names(
            entities[previous + 1..last]
                .iter()
                .filter(|e| e.kind == EntityKind::AdditionalOptions)
                .map(|e| normalizer.normalize_option(&normalizer.strip_particle(&e.value))),
        );
        let segmentation = segment(&normalizer, &entities[..last], Default::default());
        check_fixed_temperatures(&normalizer, &segmentation.lines)?;
        require_drinks(&segmentation.lines)?;

        for line in &segmentation.lines {
            let mut current = line.option_set();
            for option in new_options.iter() {
                current.remove(option);
            }
            cart.add_additional_options(
                &line.drink,
                line.quantity,
                line.temperature,
                line.size,
                &current,
                &new_options,
            );
        }
    } else {
        let segmentation = segment(&normalizer, &entities, Default::default());
        check_fixed_temperatures(&normalizer, &segmentation.lines)?;
        require_drinks(&segmentation.lines)?;

        for line in &segmentation.lines {
            if line.options.is_empty() {
                add_line(cart, line);
            } else {
                cart.add_additional_options(
                    &line.drink,
                    line.quantity,
                    line.temperature,
                    line.size,
                    &OptionSet::new(),
                    &line.option_set(),
                );
            }
        }
    }

    reply.say(format!(
        "말씀하신 옵션이 추가 되었습니다. 주문하신 음료는 {}입니다. {FOLLOW_UP}",
        cart.summary()
    ));
    Ok(())
}

/// An option said twice ("샷 들어간 라떼에서 샷 빼줘") is the one to drop; otherwise the
/// last distinct option mentioned.
fn option_to_remove(mentioned: &[String]) -> Option<String> {
    let distinct = OptionSet::from_names(mentioned);
    let names: Vec<&str> = distinct.iter().collect();
    names
        .iter()
        .rev()
        .find(|name| mentioned.iter().filter(|m| m == *name).count() > 1)
        .or(names.last())
        .map(|name| name.to_string())
}

pub fn remove_option(cart: &mut Cart, turn: &Turn, reply: &mut ActionReply) -> Result<(), OrderError> {
    let normalizer = cart.normalizer();
    let segmentation = segment(&normalizer, &turn.entities, Default::default());
    require_drinks(&segmentation.lines)?;

    if segmentation.lines.iter().all(|line| line.options.is_empty()) {
        reply.say("제거할 옵션을 지정해주세요.");
        return Ok(());
    }

    for line in &segmentation.lines {
        let Some(option) = option_to_remove(&line.options) else {
            continue;
        };
        cart.remove_additional_options(
            &line.drink,
            line.quantity,
            line.temperature,
            line.size,
            &line.option_set(),
            &option,
        )?;
    }

    reply.say(format!(
        "말씀하신 옵션이 제거 되었습니다. 주문하신 음료는 {}입니다. {FOLLOW_UP}",
        cart.summary()
    ));
    Ok(())
}
