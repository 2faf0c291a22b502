use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};

use crate::ParamSet;

/// Length of the truncated hash suffix. 10 base64 characters keep roughly
/// 60 bits of the digest, so collisions are possible in principle; callers
/// treat them as an accepted risk. Changing this orphans every identifier
/// issued under the old length.
pub const SHORT_HASH_LEN: usize = 10;

/// Parameters whose name starts with this prefix are assembly-placement
/// metadata and never contribute to a model's identity.
pub const POSITION_PREFIX: &str = "position";

/// Canonical string form of a parameter set: placement keys removed,
/// entries rendered as `key=value` in key order, joined with `;`.
pub fn canonical_param_string(params: &ParamSet) -> String {
    params
        .iter()
        .filter(|(key, _)| !key.starts_with(POSITION_PREFIX))
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(";")
}

/// Deterministic filesystem-safe identifier for a (model type, parameter
/// set) pair: `modeltype-hash`, where the hash is a truncated base64
/// SHA-256 of `modeltype:canonical_params` with `/`, `+`, and `=`
/// substituted by `_`.
pub fn compute_identifier(model_type: &str, params: &ParamSet) -> String {
    let canonical = canonical_param_string(params);
    let digest = Sha256::digest(format!("{model_type}:{canonical}").as_bytes());

    let short_hash: String = BASE64
        .encode(digest)
        .chars()
        .map(|ch| match ch {
            '/' | '+' | '=' => '_',
            other => other,
        })
        .take(SHORT_HASH_LEN)
        .collect();

    format!("{model_type}-{short_hash}")
}

#[cfg(test)]
mod tests {
    use super::{SHORT_HASH_LEN, canonical_param_string, compute_identifier};
    use crate::{ParamSet, ParamValue};

    fn cylinder_params() -> ParamSet {
        let mut params = ParamSet::new();
        params.insert("radius".to_string(), ParamValue::Int(5));
        params.insert("height".to_string(), ParamValue::Int(10));
        params
    }

    #[test]
    fn canonical_string_sorts_by_key() {
        let params = cylinder_params();
        assert_eq!(canonical_param_string(&params), "height=10;radius=5");
    }

    #[test]
    fn identifier_is_deterministic() {
        let params = cylinder_params();
        assert_eq!(
            compute_identifier("cylinder", &params),
            compute_identifier("cylinder", &params)
        );
    }

    #[test]
    fn identifier_ignores_insertion_order() {
        let forward = cylinder_params();

        let mut reversed = ParamSet::new();
        reversed.insert("height".to_string(), ParamValue::Int(10));
        reversed.insert("radius".to_string(), ParamValue::Int(5));

        assert_eq!(
            compute_identifier("cylinder", &forward),
            compute_identifier("cylinder", &reversed)
        );
    }

    #[test]
    fn position_parameters_do_not_affect_identity() {
        let bare = cylinder_params();

        let mut placed = cylinder_params();
        placed.insert("position_x".to_string(), ParamValue::Int(5));
        placed.insert("positionX".to_string(), ParamValue::Int(5));

        assert_eq!(
            compute_identifier("cylinder", &bare),
            compute_identifier("cylinder", &placed)
        );
    }

    #[test]
    fn different_parameters_yield_different_identifiers() {
        let mut first = ParamSet::new();
        first.insert("id".to_string(), ParamValue::Int(1));
        let mut second = ParamSet::new();
        second.insert("id".to_string(), ParamValue::Int(2));

        assert_ne!(
            compute_identifier("washer", &first),
            compute_identifier("washer", &second)
        );
    }

    #[test]
    fn identifier_shape_is_type_dash_short_hash() {
        let mut params = cylinder_params();
        params.insert("position_x".to_string(), ParamValue::Int(0));

        let identifier = compute_identifier("cylinder", &params);
        let suffix = identifier
            .strip_prefix("cylinder-")
            .expect("identifier should start with the model type");

        assert_eq!(suffix.len(), SHORT_HASH_LEN);
        assert!(
            suffix
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        );
    }

    #[test]
    fn empty_model_type_yields_leading_hyphen() {
        let identifier = compute_identifier("", &ParamSet::new());
        assert!(identifier.starts_with('-'));
        assert_eq!(identifier.len(), 1 + SHORT_HASH_LEN);
    }

    #[test]
    fn identically_stringified_values_share_an_identifier() {
        let mut int = ParamSet::new();
        int.insert("id".to_string(), ParamValue::Int(1));
        let mut text = ParamSet::new();
        text.insert("id".to_string(), ParamValue::Text("1".to_string()));

        assert_eq!(
            compute_identifier("washer", &int),
            compute_identifier("washer", &text)
        );
    }
}
