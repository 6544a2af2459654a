pub mod action;
pub mod completed_order;
pub mod entity;
pub mod order;
pub mod vocabulary;

pub use action::KioskAction;
pub use completed_order::{CompletedOrder, OrderEvent};
pub use entity::{
    count_kind, drop_classifier_entities, sorted_entities, Entity, EntityKind,
    CLASSIFIER_EXTRACTOR,
};
pub use order::{CartLine, MappedOrders, OptionSet, OrderLine, Size, Temperature};
pub use vocabulary::Vocabulary;
