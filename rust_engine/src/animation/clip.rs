//! 动画片段

use super::channel::NodeChannel;

/// 片段未指定速率时使用的每秒 tick 数
pub const DEFAULT_TICKS_PER_SECOND: f32 = 25.0;

/// 动画片段
#[derive(Clone, Debug, Default)]
pub struct AnimationClip {
    pub name: String,
    /// 每秒 tick 数，0 表示未指定
    pub ticks_per_second: f32,
    /// 时长（tick）
    pub duration: f32,
    pub channels: Vec<NodeChannel>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, ticks_per_second: f32, duration: f32) -> Self {
        Self {
            name: name.into(),
            ticks_per_second,
            duration,
            channels: Vec::new(),
        }
    }

    pub fn with_channel(mut self, channel: NodeChannel) -> Self {
        self.channels.push(channel);
        self
    }

    /// 实际使用的每秒 tick 数
    pub fn effective_ticks_per_second(&self) -> f32 {
        if self.ticks_per_second != 0.0 {
            self.ticks_per_second
        } else {
            DEFAULT_TICKS_PER_SECOND
        }
    }

    /// 秒 -> 片段内 tick 时间
    ///
    /// 取模前先丢弃时长的小数部分；整数时长为 0 的片段始终返回 0。
    pub fn animation_time_ticks(&self, time_in_seconds: f64) -> f32 {
        let ticks = time_in_seconds * self.effective_ticks_per_second() as f64;
        let whole_duration = self.duration.trunc() as f64;
        if whole_duration == 0.0 {
            return 0.0;
        }
        (ticks % whole_duration) as f32
    }

    /// 按节点名查找轨道索引
    pub fn find_channel(&self, node_name: &str) -> Option<usize> {
        self.channels.iter().position(|c| c.node_name == node_name)
    }

    pub fn channel(&self, index: usize) -> Option<&NodeChannel> {
        self.channels.get(index)
    }
}
