mod ema;

pub use ema::ema_series;
