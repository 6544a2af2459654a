use crate::errors::OrderError;
use crate::models::{EntityKind, Size};
use crate::services::cart::Cart;
use crate::services::segmenter::SegmentContext;
use crate::services::validation::{check_temperature_change, require_drinks};

use super::{segment, ActionReply, Turn, FOLLOW_UP};

/// The last size mentioned is the new one; the last different size before it, if any,
/// is the size being replaced.
pub fn change_size(cart: &mut Cart, turn: &Turn, reply: &mut ActionReply) -> Result<(), OrderError> {
    let normalizer = cart.normalizer();
    let segmentation = segment(
        &normalizer,
        &turn.entities,
        SegmentContext {
            size_change: true,
            ..Default::default()
        },
    );
    require_drinks(&segmentation.lines)?;

    let Some(new_size) = segmentation
        .last_value(EntityKind::Size)
        .and_then(|v| normalizer.size(v))
    else {
        reply.say("새로운 사이즈를 지정해주세요.");
        return Ok(());
    };

    let current_size = segmentation
        .entities
        .iter()
        .filter(|e| e.kind == EntityKind::Size)
        .filter_map(|e| normalizer.size(&e.value))
        .filter(|s| *s != new_size)
        .last()
        .unwrap_or(Size::Medium);

    tracing::debug!(from = %current_size, to = %new_size, "changing size");
    for line in &segmentation.lines {
        let options = line.option_set();
        cart.subtract(
            &line.drink,
            Some(line.quantity),
            line.temperature,
            current_size,
            &options,
        )?;
        cart.add(&line.drink, line.quantity, line.temperature, new_size, &options);
    }

    reply.say(format!(
        "사이즈가 변경되었습니다. 주문하신 음료는 {}입니다. {FOLLOW_UP}",
        cart.summary()
    ));
    Ok(())
}

/// The last temperature mentioned is the new one. A lone temperature leaves the current
/// temperature at its default, so "라떼 아이스로" turns a hot latte iced.
pub fn change_temperature(
    cart: &mut Cart,
    turn: &Turn,
    reply: &mut ActionReply,
) -> Result<(), OrderError> {
    let normalizer = cart.normalizer();
    let segmentation = segment(
        &normalizer,
        &turn.entities,
        SegmentContext {
            temperature_change: true,
            ..Default::default()
        },
    );
    require_drinks(&segmentation.lines)?;

    let Some(new_temperature) = segmentation
        .last_value(EntityKind::Temperature)
        .and_then(|v| normalizer.temperature(v))
    else {
        reply.say("새로운 온도를 지정해주세요.");
        return Ok(());
    };

    check_temperature_change(&normalizer, &segmentation.lines, new_temperature)?;

    for line in &segmentation.lines {
        let options = line.option_set();
        cart.subtract(
            &line.drink,
            Some(line.quantity),
            line.temperature,
            line.size,
            &options,
        )?;
        cart.add(&line.drink, line.quantity, new_temperature, line.size, &options);
    }

    reply.say(format!(
        "온도를 변경하셨습니다. 주문하신 음료는 {}입니다. {FOLLOW_UP}",
        cart.summary()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{cart, entities};
    use super::*;
    use crate::models::{EntityKind as K, OptionSet, Temperature};

    #[test]
    fn test_change_size_from_default() {
        let mut cart = cart();
        cart.add("카페라떼", 2, Temperature::Hot, Size::Medium, &OptionSet::new());
        let text = "카페라떼 한 잔 라지로 바꿔주세요";
        let turn = Turn::new(
            text,
            entities(
                text,
                &[(K::DrinkType, "카페라떼"), (K::Quantity, "한"), (K::Size, "라지로")],
            ),
        );
        let mut reply = ActionReply::default();
        change_size(&mut cart, &turn, &mut reply).unwrap();
        assert_eq!(
            cart.summary(),
            "핫 카페라떼 미디움 한 잔, 핫 카페라떼 라지 한 잔"
        );
        assert!(reply.messages[0].starts_with("사이즈가 변경되었습니다."));
    }

    #[test]
    fn test_change_size_between_named_sizes() {
        let mut cart = cart();
        cart.add("아메리카노", 1, Temperature::Ice, Size::Large, &OptionSet::new());
        let text = "아이스 아메리카노 라지 말고 엑스라지로";
        let turn = Turn::new(
            text,
            entities(
                text,
                &[
                    (K::Temperature, "아이스"),
                    (K::DrinkType, "아메리카노"),
                    (K::Size, "라지"),
                    (K::Size, "엑스라지로"),
                ],
            ),
        );
        let mut reply = ActionReply::default();
        change_size(&mut cart, &turn, &mut reply).unwrap();
        assert_eq!(cart.summary(), "아이스 아메리카노 엑스라지 한 잔");
    }

    #[test]
    fn test_change_size_without_size_prompts() {
        let mut cart = cart();
        cart.add("카페라떼", 1, Temperature::Hot, Size::Medium, &OptionSet::new());
        let text = "카페라떼 사이즈 바꿔줘";
        let turn = Turn::new(text, entities(text, &[(K::DrinkType, "카페라떼")]));
        let mut reply = ActionReply::default();
        change_size(&mut cart, &turn, &mut reply).unwrap();
        assert_eq!(reply.messages, vec!["새로운 사이즈를 지정해주세요.".to_string()]);
        assert_eq!(cart.cups("카페라떼")[0].size, Size::Medium);
    }

    #[test]
    fn test_change_size_of_missing_cup_fails() {
        let mut cart = cart();
        cart.add("카페라떼", 1, Temperature::Ice, Size::Medium, &OptionSet::new());
        let text = "카페라떼 라지로";
        let turn = Turn::new(
            text,
            entities(text, &[(K::DrinkType, "카페라떼"), (K::Size, "라지로")]),
        );
        let mut reply = ActionReply::default();
        let err = change_size(&mut cart, &turn, &mut reply).unwrap_err();
        assert!(matches!(err, OrderError::InsufficientQuantity { .. }));
        assert_eq!(cart.cups("카페라떼")[0].temperature, Temperature::Ice);
    }

    #[test]
    fn test_change_size_keeps_lines_before_a_failure() {
        let mut cart = cart();
        cart.add("아메리카노", 1, Temperature::Hot, Size::Medium, &OptionSet::new());
        cart.add("카페라떼", 1, Temperature::Ice, Size::Medium, &OptionSet::new());
        let text = "아메리카노랑 카페라떼 라지로";
        let turn = Turn::new(
            text,
            entities(
                text,
                &[
                    (K::DrinkType, "아메리카노"),
                    (K::DrinkType, "카페라떼"),
                    (K::Size, "라지로"),
                ],
            ),
        );
        let mut reply = ActionReply::default();
        let err = change_size(&mut cart, &turn, &mut reply).unwrap_err();
        assert!(matches!(err, OrderError::InsufficientQuantity { .. }));
        assert_eq!(cart.cups("아메리카노")[0].size, Size::Large);
        assert_eq!(cart.cups("카페라떼")[0].size, Size::Medium);
        assert_eq!(cart.cups("카페라떼")[0].temperature, Temperature::Ice);
    }

    #[test]
    fn test_change_temperature_to_ice() {
        let mut cart = cart();
        cart.add("카페모카", 1, Temperature::Hot, Size::Medium, &OptionSet::new());
        let text = "카페모카 아이스로 바꿔줘";
        let turn = Turn::new(
            text,
            entities(text, &[(K::DrinkType, "카페모카"), (K::Temperature, "아이스로")]),
        );
        let mut reply = ActionReply::default();
        change_temperature(&mut cart, &turn, &mut reply).unwrap();
        assert_eq!(cart.summary(), "아이스 카페모카 미디움 한 잔");
        assert!(reply.messages[0].starts_with("온도를 변경하셨습니다."));
    }

    #[test]
    fn test_change_temperature_of_fixed_drink_is_rejected() {
        let mut cart = cart();
        cart.add("허브티", 1, Temperature::Hot, Size::Medium, &OptionSet::new());
        let text = "허브티 차갑게 해줘";
        let turn = Turn::new(
            text,
            entities(text, &[(K::DrinkType, "허브티"), (K::Temperature, "차갑게")]),
        );
        let mut reply = ActionReply::default();
        let err = change_temperature(&mut cart, &turn, &mut reply).unwrap_err();
        assert!(matches!(err, OrderError::FixedTemperature(_)));
        assert_eq!(cart.cups("허브티")[0].temperature, Temperature::Hot);
    }
}
