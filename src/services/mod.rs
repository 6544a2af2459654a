pub mod actions;
pub mod cart;
pub mod kiosk;
pub mod nlu;
pub mod normalize;
pub mod segmenter;
pub mod session;
pub mod validation;
