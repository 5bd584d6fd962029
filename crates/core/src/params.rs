//! Lenient extraction of typed overrides from a JSON params object.
//!
//! A missing key or a value of the wrong JSON type yields the supplied
//! default, so a partially filled params object is always usable. Range
//! checks happen later in [`PortraitConfig::validate`](crate::config::PortraitConfig::validate).

use serde_json::Value;

/// Reads `params[name]` as `f64` (integers are accepted), else `default`.
pub fn param_f64(params: &Value, name: &str, default: f64) -> f64 {
    params.get(name).and_then(Value::as_f64).unwrap_or(default)
}

/// Reads `params[name]` as `f32`, else `default`.
pub fn param_f32(params: &Value, name: &str, default: f32) -> f32 {
    params
        .get(name)
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .unwrap_or(default)
}

/// Reads `params[name]` as a non-negative integer, else `default`.
pub fn param_usize(params: &Value, name: &str, default: usize) -> usize {
    params
        .get(name)
        .and_then(Value::as_u64)
        .and_then(|v| usize::try_from(v).ok())
        .unwrap_or(default)
}

/// Reads `params[name]` as `u64`, else `default`.
pub fn param_u64(params: &Value, name: &str, default: u64) -> u64 {
    params.get(name).and_then(Value::as_u64).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn param_f64_reads_float_and_integer() {
        let params = json!({"scatter_radius": 9.5, "sample_scale": 6});
        assert_eq!(param_f64(&params, "scatter_radius", 1.0), 9.5);
        assert_eq!(param_f64(&params, "sample_scale", 1.0), 6.0);
    }

    #[test]
    fn param_f32_falls_back_on_wrong_type() {
        let params = json!({"particle_size": "big"});
        assert_eq!(param_f32(&params, "particle_size", 2.0), 2.0);
    }

    #[test]
    fn param_f32_falls_back_on_null() {
        let params = json!({"glow_intensity": null});
        assert_eq!(param_f32(&params, "glow_intensity", 1.5), 1.5);
    }

    #[test]
    fn param_usize_rejects_fractional_and_negative() {
        let params = json!({"a": 2.5, "b": -3});
        assert_eq!(param_usize(&params, "a", 7), 7);
        assert_eq!(param_usize(&params, "b", 7), 7);
    }

    #[test]
    fn param_usize_reads_count() {
        let params = json!({"particle_count": 500});
        assert_eq!(param_usize(&params, "particle_count", 15_000), 500);
    }

    #[test]
    fn param_u64_reads_large_seed() {
        let params = json!({"seed": u64::MAX});
        assert_eq!(param_u64(&params, "seed", 1), u64::MAX);
    }

    #[test]
    fn helpers_tolerate_non_object_params() {
        let params = json!([1, 2, 3]);
        assert_eq!(param_f64(&params, "x", 4.0), 4.0);
        assert_eq!(param_usize(&params, "x", 4), 4);
        assert_eq!(param_u64(&params, "x", 4), 4);
    }
}
