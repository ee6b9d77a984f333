pub mod condition;
pub mod context;
pub mod indicator;
pub mod pattern;
pub mod price;
pub mod result;

pub use condition::{Condition, GroupMode, SequenceState};
pub use context::{ComputedLevel, EvaluationContext, Level};
pub use price::CandleBias;
pub use result::{ConditionValue, EvaluationResult, Verdict};
