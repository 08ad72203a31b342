//! 节点动画轨道与关键帧采样
//!
//! 每条轨道对应一个节点，缩放/旋转/平移三组关键帧相互独立，数量和时间点可以不同。

use glam::{Quat, Vec3};

use super::keyframe::{Keyframe, QuatKey, VectorKey};
use crate::skeleton::BoneTransform;

/// 单个节点的动画轨道
#[derive(Clone, Debug, Default)]
pub struct NodeChannel {
    pub node_name: String,
    pub scaling_keys: Vec<VectorKey>,
    pub rotation_keys: Vec<QuatKey>,
    pub position_keys: Vec<VectorKey>,
}

impl NodeChannel {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
            ..Default::default()
        }
    }

    /// 只含单个关键帧的静态轨道
    pub fn constant(node_name: impl Into<String>, transform: BoneTransform) -> Self {
        Self {
            node_name: node_name.into(),
            scaling_keys: vec![VectorKey::new(0.0, transform.scale)],
            rotation_keys: vec![QuatKey::new(0.0, transform.rotation)],
            position_keys: vec![VectorKey::new(0.0, transform.translation)],
        }
    }

    /// 在指定 tick 时间采样缩放
    pub fn sample_scaling(&self, time: f32) -> Vec3 {
        interpolate_vector(&self.scaling_keys, time, Vec3::ONE)
    }

    /// 在指定 tick 时间采样旋转
    pub fn sample_rotation(&self, time: f32) -> Quat {
        interpolate_rotation(&self.rotation_keys, time)
    }

    /// 在指定 tick 时间采样平移
    pub fn sample_position(&self, time: f32) -> Vec3 {
        interpolate_vector(&self.position_keys, time, Vec3::ZERO)
    }

    /// 采样完整的本地变换
    pub fn sample(&self, time: f32) -> BoneTransform {
        BoneTransform {
            translation: self.sample_position(time),
            rotation: self.sample_rotation(time),
            scale: self.sample_scaling(time),
        }
    }

    /// 三组关键帧中的最大时间
    pub fn last_key_time(&self) -> f32 {
        self.scaling_keys
            .iter()
            .map(|k| k.time)
            .chain(self.rotation_keys.iter().map(|k| k.time))
            .chain(self.position_keys.iter().map(|k| k.time))
            .fold(0.0f32, f32::max)
    }
}

/// 查找满足 `time < keys[i + 1].time` 的第一个区间起点
///
/// 从头线性扫描；时间超出所有内部边界时回退到 0。
/// 调用方保证 `keys.len() >= 2`。
pub fn find_key_index<K: Keyframe>(keys: &[K], time: f32) -> usize {
    for i in 0..keys.len().saturating_sub(1) {
        if time < keys[i + 1].time() {
            return i;
        }
    }
    0
}

/// 区间内插值系数，不做截断；零长度区间返回 0
fn interpolation_factor<K: Keyframe>(start: &K, end: &K, time: f32) -> f32 {
    let delta = end.time() - start.time();
    if delta == 0.0 {
        return 0.0;
    }
    (time - start.time()) / delta
}

/// 缩放/平移插值
pub fn interpolate_vector(keys: &[VectorKey], time: f32, default: Vec3) -> Vec3 {
    match keys {
        [] => default,
        [only] => only.value,
        _ => {
            let index = find_key_index(keys, time);
            let start = &keys[index];
            let end = &keys[index + 1];
            let factor = interpolation_factor(start, end, time);
            start.value + (end.value - start.value) * factor
        }
    }
}

/// 旋转插值（球面插值后归一化）
pub fn interpolate_rotation(keys: &[QuatKey], time: f32) -> Quat {
    match keys {
        [] => Quat::IDENTITY,
        [only] => only.value,
        _ => {
            let index = find_key_index(keys, time);
            let start = &keys[index];
            let end = &keys[index + 1];
            let factor = interpolation_factor(start, end, time);
            start.value.slerp(end.value, factor).normalize()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector_keys() -> Vec<VectorKey> {
        vec![
            VectorKey::new(0.0, Vec3::ZERO),
            VectorKey::new(10.0, Vec3::new(10.0, 0.0, 0.0)),
            VectorKey::new(20.0, Vec3::new(10.0, 20.0, 0.0)),
        ]
    }

    #[test]
    fn test_single_key_ignores_time() {
        let keys = [VectorKey::new(3.0, Vec3::new(1.0, 2.0, 3.0))];
        for t in [0.0, 3.0, 99.5, -4.0] {
            assert_eq!(interpolate_vector(&keys, t, Vec3::ZERO), Vec3::new(1.0, 2.0, 3.0));
        }
        let q = Quat::from_rotation_y(0.7);
        assert_eq!(interpolate_rotation(&[QuatKey::new(0.0, q)], 42.0), q);
    }

    #[test]
    fn test_empty_keys_use_identity_components() {
        let channel = NodeChannel::new("empty");
        let pose = channel.sample(5.0);
        assert_eq!(pose.scale, Vec3::ONE);
        assert_eq!(pose.rotation, Quat::IDENTITY);
        assert_eq!(pose.translation, Vec3::ZERO);
    }

    #[test]
    fn test_find_key_index() {
        let keys = vector_keys();
        assert_eq!(find_key_index(&keys, 0.0), 0);
        assert_eq!(find_key_index(&keys, 9.99), 0);
        assert_eq!(find_key_index(&keys, 10.0), 1);
        assert_eq!(find_key_index(&keys, 19.0), 1);
        // 超出所有边界时回退到 0
        assert_eq!(find_key_index(&keys, 20.0), 0);
        assert_eq!(find_key_index(&keys, 25.0), 0);
    }

    #[test]
    fn test_sampling_at_key_times_returns_key_values() {
        let keys = vec![
            VectorKey::new(0.0, Vec3::new(1.0, 1.0, 1.0)),
            VectorKey::new(4.0, Vec3::new(3.0, 5.0, 7.0)),
        ];
        assert_eq!(interpolate_vector(&keys, 0.0, Vec3::ZERO), Vec3::new(1.0, 1.0, 1.0));
        // 落在末尾边界时回退到区间 0，系数为 1
        let at_end = interpolate_vector(&keys, 4.0, Vec3::ZERO);
        assert!(at_end.abs_diff_eq(Vec3::new(3.0, 5.0, 7.0), 1e-6));
    }

    #[test]
    fn test_linear_interpolation_midpoint() {
        let keys = vector_keys();
        let v = interpolate_vector(&keys, 15.0, Vec3::ZERO);
        assert!(v.abs_diff_eq(Vec3::new(10.0, 10.0, 0.0), 1e-5));
    }

    #[test]
    fn test_rotation_slerp_and_boundaries() {
        let a = Quat::IDENTITY;
        let b = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
        let keys = [QuatKey::new(0.0, a), QuatKey::new(2.0, b)];

        assert!(interpolate_rotation(&keys, 0.0).abs_diff_eq(a, 1e-5));
        assert!(interpolate_rotation(&keys, 2.0).abs_diff_eq(b, 1e-5));

        let mid = interpolate_rotation(&keys, 1.0);
        let expected = Quat::from_rotation_z(std::f32::consts::FRAC_PI_4);
        assert!(mid.abs_diff_eq(expected, 1e-5));
        assert!((mid.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_independent_key_counts() {
        let mut channel = NodeChannel::new("n");
        channel.scaling_keys = vec![VectorKey::new(0.0, Vec3::splat(2.0))];
        channel.position_keys = vector_keys();
        let pose = channel.sample(5.0);
        assert_eq!(pose.scale, Vec3::splat(2.0));
        assert!(pose.translation.abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));
        assert_eq!(channel.last_key_time(), 20.0);
    }

    #[test]
    fn test_zero_length_interval_does_not_produce_nan() {
        let keys = vec![
            VectorKey::new(1.0, Vec3::X),
            VectorKey::new(1.0, Vec3::Y),
        ];
        let v = interpolate_vector(&keys, 0.5, Vec3::ZERO);
        assert_eq!(v, Vec3::X);
    }
}
