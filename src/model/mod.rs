pub mod brick;
pub mod candle;
pub mod point;
pub mod tick;
