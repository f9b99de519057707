use crate::model::Replicas;
use tracing::warn;

/// レプリカ数を決定
///
/// 戻り値の `bool` は、スケール不可のプロファイルで利用者の指定値を拒否したかどうか。
pub fn resolve_replicas(requested: Option<i32>, policy: Option<&Replicas>) -> (i32, bool) {
    match (requested, policy) {
        (Some(requested), Some(policy)) if policy.deny_scale && requested != policy.replicas => {
            warn!(
                requested,
                replicas = policy.replicas,
                "Scaling not allowed for this environment, using profile default"
            );
            (policy.replicas, true)
        }
        (Some(requested), _) => (requested, false),
        (None, Some(policy)) => (policy.replicas, false),
        (None, None) => {
            warn!("No replica settings for this environment, defaulting to 1");
            (1, false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED: Replicas = Replicas {
        replicas: 1,
        deny_scale: true,
    };
    const SCALABLE: Replicas = Replicas {
        replicas: 2,
        deny_scale: false,
    };

    #[test]
    fn test_deny_scale_clamps_request() {
        assert_eq!(resolve_replicas(Some(3), Some(&FIXED)), (1, true));
        assert_eq!(resolve_replicas(Some(1), Some(&FIXED)), (1, false));
    }

    #[test]
    fn test_request_is_honored_when_scalable() {
        assert_eq!(resolve_replicas(Some(5), Some(&SCALABLE)), (5, false));
        assert_eq!(resolve_replicas(Some(5), None), (5, false));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(resolve_replicas(None, Some(&SCALABLE)), (2, false));
        assert_eq!(resolve_replicas(None, None), (1, false));
    }

    #[test]
    fn test_never_violates_deny_scale() {
        for requested in [None, Some(0), Some(1), Some(2), Some(10), Some(-1)] {
            let (replicas, _) = resolve_replicas(requested, Some(&FIXED));
            assert_eq!(replicas, FIXED.replicas);
        }
    }
}
