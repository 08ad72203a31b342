//! 动画系统
//!
//! 提供关键帧插值、动画片段、层级求值（单动画与双动画混合）和播放控制。

mod channel;
mod clip;
mod evaluator;
mod keyframe;
mod playback;

pub use channel::{find_key_index, interpolate_rotation, interpolate_vector, NodeChannel};
pub use clip::{AnimationClip, DEFAULT_TICKS_PER_SECOND};
pub use evaluator::HierarchyEvaluator;
pub use keyframe::{Keyframe, QuatKey, VectorKey};
pub use playback::PlaybackState;
