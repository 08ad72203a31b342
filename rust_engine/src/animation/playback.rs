//! 播放控制状态
//!
//! 当前动画、混合用的第二动画和混合系数。混合系数在 [0, 1] 之间往返步进。

use crate::config::get_config;

#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    /// 当前播放的动画
    pub active_clip: usize,
    /// 混合时的第二个动画
    pub secondary_clip: usize,
    /// 混合系数，0 为只用当前动画，1 为只用第二动画
    pub blend_factor: f32,
    /// 步进方向，+1 或 -1
    blend_direction: f32,
    clip_count: usize,
}

impl PlaybackState {
    pub fn new(clip_count: usize) -> Self {
        Self {
            active_clip: 0,
            secondary_clip: 0,
            blend_factor: 0.0,
            blend_direction: 1.0,
            clip_count,
        }
    }

    pub fn clip_count(&self) -> usize {
        self.clip_count
    }

    /// 切换到下一个动画，末尾回到 0
    pub fn select_next_clip(&mut self) -> usize {
        self.active_clip = next_index(self.active_clip, self.clip_count);
        self.active_clip
    }

    /// 切换第二动画，末尾回到 0
    pub fn select_next_secondary_clip(&mut self) -> usize {
        self.secondary_clip = next_index(self.secondary_clip, self.clip_count);
        self.secondary_clip
    }

    /// 按配置步长调整混合系数，到达端点时夹紧并反向
    pub fn step_blend(&mut self) -> f32 {
        let step = get_config().blend_step;
        self.step_blend_by(step)
    }

    /// 按指定步长调整混合系数
    pub fn step_blend_by(&mut self, step: f32) -> f32 {
        self.blend_factor += self.blend_direction * step;
        if self.blend_factor >= 1.0 {
            self.blend_factor = 1.0;
            self.blend_direction = -self.blend_direction;
        } else if self.blend_factor <= 0.0 {
            self.blend_factor = 0.0;
            self.blend_direction = -self.blend_direction;
        }
        self.blend_factor
    }
}

fn next_index(current: usize, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        (current + 1) % count
    }
}
