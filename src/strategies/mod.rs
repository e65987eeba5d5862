pub mod twap;

// 핵심 전략 재노출
pub use twap::{slice_quantities, CancelHandle, TwapEngine, TwapPlan};
