//! 引擎配置
//!
//! 所有参数扁平化，直接在代码中修改默认值即可。

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// 引擎配置（扁平化，不嵌套）
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    // ========== 导入 ==========
    /// 导入 glTF 时使用的每秒 tick 数，默认 1000.0
    /// glTF 关键帧时间以秒为单位，导入后换算成毫秒 tick
    pub import_ticks_per_second: f32,

    // ========== 播放控制 ==========
    /// 每次调整混合系数的步长，默认 0.1
    pub blend_step: f32,

    // ========== 调试 ==========
    /// 是否在加载时输出节点层级和偏移矩阵，默认 false
    pub debug_log: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            import_ticks_per_second: 1000.0,
            blend_step: 0.1,
            debug_log: false,
        }
    }
}

/// 全局配置实例
static ENGINE_CONFIG: Lazy<RwLock<EngineConfig>> = Lazy::new(|| {
    RwLock::new(EngineConfig::default())
});

/// 获取当前配置（只读）
pub fn get_config() -> EngineConfig {
    match ENGINE_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// 手动设置配置（用于运行时调试）
pub fn set_config(config: EngineConfig) {
    match ENGINE_CONFIG.write() {
        Ok(mut guard) => *guard = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

/// 重置为默认配置
pub fn reset_config() {
    set_config(EngineConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.import_ticks_per_second, 1000.0);
        assert_eq!(config.blend_step, 0.1);
        assert!(!config.debug_log);
    }
}
